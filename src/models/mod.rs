//! Modelos del sistema
//!
//! Cada entidad es un documento JSON con `id`, `createdAt` y `updatedAt`.
//! Las referencias entre entidades son ids que se resuelven al leer.

pub mod appointment;
pub mod customer;
pub mod invoice;
pub mod technician;
pub mod vehicle;
pub mod work_order;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::database::Collection;

/// Entidad persistible en el almacén de documentos
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Nombre legible para mensajes de error
    const RESOURCE: &'static str;

    fn id(&self) -> Uuid;
}

pub use appointment::{Appointment, AppointmentStatus};
pub use customer::{Address, CommunicationPreference, Customer};
pub use invoice::{Invoice, InvoiceLineItem, InvoiceStatus, LineItemKind};
pub use technician::Technician;
pub use vehicle::{MileageRecord, MileageSource, Vehicle};
pub use work_order::{LaborLine, PartLine, ServiceLine, StatusChange, WorkOrder, WorkOrderStatus};
