//! Services module
//!
//! Este módulo contiene la lógica de negocio que cruza entidades: el
//! pipeline de work orders, kilometraje de vehículos, avisos y facturación.

pub mod invoice_service;
pub mod mileage_service;
pub mod notification_service;
pub mod work_order_pipeline;

pub use invoice_service::InvoiceService;
pub use mileage_service::MileageService;
pub use notification_service::{LogNotifier, Notifier, WebhookNotifier};
pub use work_order_pipeline::WorkOrderPipeline;
