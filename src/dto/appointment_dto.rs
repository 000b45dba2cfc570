use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::common_dto::deserialize_some;
use crate::models::AppointmentStatus;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, max = 200))]
    pub service_type: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub vehicle_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub technician_id: Option<Option<Uuid>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 200))]
    pub service_type: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub work_order_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub technician_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
