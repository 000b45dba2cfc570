use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::work_order_dto::WorkOrderSummary;
use crate::models::{Customer, Vehicle};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub customer_id: Uuid,
    pub year: i32,
    #[validate(
        length(min = 1, max = 50),
        custom = "crate::utils::validation::validate_not_empty"
    )]
    pub make: String,
    #[validate(
        length(min = 1, max = 50),
        custom = "crate::utils::validation::validate_not_empty"
    )]
    pub model: String,
    #[validate(custom = "crate::utils::validation::validate_vin")]
    pub vin: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(length(max = 30))]
    pub color: Option<String>,
    /// Kilometraje inicial; se guarda como primera lectura manual
    pub mileage: Option<u32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    /// Transferir el vehículo a otro cliente
    pub customer_id: Option<Uuid>,
    pub year: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub model: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_vin")]
    pub vin: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub license_plate: Option<String>,
    #[validate(length(max = 30))]
    pub color: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// Lectura manual de odómetro
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MileageReadingRequest {
    pub mileage: u32,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    pub customer_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Vehículo con su dueño y su historial de servicio resuelto
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetail {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub customer: Option<Customer>,
    pub service_records: Vec<WorkOrderSummary>,
}
