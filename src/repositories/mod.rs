//! Repositorios
//!
//! Acceso tipado a las colecciones del almacén de documentos.

pub mod document_repository;

pub use document_repository::Repository;

use crate::models::{Appointment, Customer, Invoice, Technician, Vehicle, WorkOrder};

pub type CustomerRepository = Repository<Customer>;
pub type VehicleRepository = Repository<Vehicle>;
pub type TechnicianRepository = Repository<Technician>;
pub type WorkOrderRepository = Repository<WorkOrder>;
pub type AppointmentRepository = Repository<Appointment>;
pub type InvoiceRepository = Repository<Invoice>;
