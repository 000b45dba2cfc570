use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common_dto::deserialize_some;
use crate::models::{
    Appointment, Customer, Invoice, LaborLine, PartLine, ServiceLine, Technician, Vehicle,
    WorkOrder, WorkOrderStatus,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<WorkOrderStatus>,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    /// Texto libre "a, b, c"; sólo se usa si `services` viene vacío
    #[validate(length(max = 2000))]
    pub service_requested: Option<String>,
    #[serde(default)]
    pub parts: Vec<PartLine>,
    #[serde(default)]
    pub labor: Vec<LaborLine>,
    #[validate(length(max = 5000))]
    pub diagnostic_notes: Option<String>,
    pub mileage: Option<u32>,
    pub appointment_id: Option<Uuid>,
    pub assigned_technician_id: Option<Uuid>,
}

/// Campos presentes se reemplazan; `null` limpia los opcionales
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderRequest {
    pub vehicle_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<WorkOrderStatus>,
    pub services: Option<Vec<ServiceLine>>,
    #[validate(length(max = 2000))]
    pub service_requested: Option<String>,
    pub parts: Option<Vec<PartLine>>,
    pub labor: Option<Vec<LaborLine>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub diagnostic_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub mileage: Option<Option<u32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub appointment_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_technician_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub status: WorkOrderStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderQuery {
    pub status: Option<WorkOrderStatus>,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Convertir "Oil change, Brake inspection" en líneas de servicio
pub fn services_from_text(text: &str) -> Vec<ServiceLine> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|description| ServiceLine {
            description: description.to_string(),
            completed: false,
        })
        .collect()
}

// Vista corta para historiales y búsquedas
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderSummary {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: WorkOrderStatus,
    pub service_requested: String,
    pub mileage: Option<u32>,
    pub total_estimate: Decimal,
    pub total_actual: Decimal,
    pub invoice_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&WorkOrder> for WorkOrderSummary {
    fn from(order: &WorkOrder) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            vehicle_id: order.vehicle_id,
            date: order.date,
            status: order.status,
            service_requested: order.service_requested.clone(),
            mileage: order.mileage,
            total_estimate: order.total_estimate,
            total_actual: order.total_actual,
            invoice_id: order.invoice_id,
            completed_at: order.completed_at,
        }
    }
}

// Work order con sus referencias resueltas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    pub customer: Option<Customer>,
    pub vehicle: Option<Vehicle>,
    pub technician: Option<Technician>,
    pub appointment: Option<Appointment>,
    pub invoice: Option<Invoice>,
}
