//! Modelo de WorkOrder
//!
//! Los totales (`partsTotal`, `laborTotal`, `totalEstimate`, `totalActual`) y
//! `serviceRequested` son campos derivados: los recalcula el pipeline de
//! work orders en cada escritura, nunca llegan desde el cliente.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Document;
use crate::database::Collection;

/// Estado del work order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Created,
    Scheduled,
    Diagnosing,
    AwaitingApproval,
    WaitingOnParts,
    InProgress,
    Completed,
    Invoiced,
    Cancelled,
}

impl WorkOrderStatus {
    /// Estados alcanzables desde éste
    pub fn allowed_transitions(&self) -> &'static [WorkOrderStatus] {
        use WorkOrderStatus::*;
        match self {
            Created => &[Scheduled, Diagnosing, InProgress, Cancelled],
            Scheduled => &[Diagnosing, InProgress, Cancelled],
            Diagnosing => &[AwaitingApproval, WaitingOnParts, InProgress, Cancelled],
            AwaitingApproval => &[WaitingOnParts, InProgress, Cancelled],
            WaitingOnParts => &[InProgress, Cancelled],
            InProgress => &[AwaitingApproval, WaitingOnParts, Completed, Cancelled],
            Completed => &[InProgress, Invoiced],
            Invoiced | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: WorkOrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Trabajo todavía pendiente en el taller
    pub fn is_open(&self) -> bool {
        !matches!(
            self,
            WorkOrderStatus::Completed | WorkOrderStatus::Invoiced | WorkOrderStatus::Cancelled
        )
    }

    /// El cliente recibe aviso al entrar en este estado
    pub fn notifies_customer(&self) -> bool {
        matches!(
            self,
            WorkOrderStatus::Scheduled
                | WorkOrderStatus::WaitingOnParts
                | WorkOrderStatus::InProgress
                | WorkOrderStatus::Completed
                | WorkOrderStatus::Invoiced
                | WorkOrderStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Created => "created",
            WorkOrderStatus::Scheduled => "scheduled",
            WorkOrderStatus::Diagnosing => "diagnosing",
            WorkOrderStatus::AwaitingApproval => "awaiting_approval",
            WorkOrderStatus::WaitingOnParts => "waiting_on_parts",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Invoiced => "invoiced",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Línea de servicio solicitado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartLine {
    pub part_number: Option<String>,
    pub name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl PartLine {
    /// `None` si el producto desborda `Decimal`
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaborLine {
    pub description: String,
    /// Horas estimadas
    pub hours: Decimal,
    pub actual_hours: Option<Decimal>,
    pub rate: Decimal,
    pub technician_id: Option<Uuid>,
}

impl LaborLine {
    pub fn estimated_amount(&self) -> Option<Decimal> {
        self.hours.checked_mul(self.rate)
    }

    /// Horas reales si se cargaron, si no las estimadas
    pub fn billable_hours(&self) -> Decimal {
        self.actual_hours.unwrap_or(self.hours)
    }

    pub fn actual_amount(&self) -> Option<Decimal> {
        self.billable_hours().checked_mul(self.rate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: WorkOrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: WorkOrderStatus,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    #[serde(default)]
    pub service_requested: String,
    #[serde(default)]
    pub parts: Vec<PartLine>,
    #[serde(default)]
    pub labor: Vec<LaborLine>,
    pub diagnostic_notes: Option<String>,
    /// Odómetro al ingresar al taller
    pub mileage: Option<u32>,
    pub parts_total: Decimal,
    pub labor_total: Decimal,
    pub total_estimate: Decimal,
    pub total_actual: Decimal,
    pub appointment_id: Option<Uuid>,
    pub assigned_technician_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Work order vacío en estado `created`; los totales los fija el pipeline
    pub fn new(customer_id: Uuid, vehicle_id: Uuid, date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            vehicle_id,
            date,
            status: WorkOrderStatus::Created,
            services: Vec::new(),
            service_requested: String::new(),
            parts: Vec::new(),
            labor: Vec::new(),
            diagnostic_notes: None,
            mileage: None,
            parts_total: Decimal::ZERO,
            labor_total: Decimal::ZERO,
            total_estimate: Decimal::ZERO,
            total_actual: Decimal::ZERO,
            appointment_id: None,
            assigned_technician_id: None,
            invoice_id: None,
            status_history: Vec::new(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for WorkOrder {
    const COLLECTION: Collection = Collection::WorkOrders;
    const RESOURCE: &'static str = "Work order";

    fn id(&self) -> Uuid {
        self.id
    }
}
