//! Controllers
//!
//! Un controller por recurso: reciben DTOs ya validados, aplican las reglas
//! de negocio y devuelven modelos o `ApiResponse`.

pub mod appointment_controller;
pub mod customer_controller;
pub mod invoice_controller;
pub mod search_controller;
pub mod technician_controller;
pub mod vehicle_controller;
pub mod work_order_controller;

pub use appointment_controller::AppointmentController;
pub use customer_controller::CustomerController;
pub use invoice_controller::InvoiceController;
pub use search_controller::SearchController;
pub use technician_controller::TechnicianController;
pub use vehicle_controller::VehicleController;
pub use work_order_controller::WorkOrderController;
