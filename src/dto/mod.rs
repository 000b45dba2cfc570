//! DTOs (Data Transfer Objects)
//!
//! Requests y responses de la API; los modelos persistidos viven en `models`.

pub mod appointment_dto;
pub mod common_dto;
pub mod customer_dto;
pub mod invoice_dto;
pub mod search_dto;
pub mod technician_dto;
pub mod vehicle_dto;
pub mod work_order_dto;

pub use appointment_dto::*;
pub use common_dto::*;
pub use customer_dto::*;
pub use invoice_dto::*;
pub use search_dto::*;
pub use technician_dto::*;
pub use vehicle_dto::*;
pub use work_order_dto::*;
