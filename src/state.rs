//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::database::DocumentStore;
use crate::repositories::{
    AppointmentRepository, CustomerRepository, InvoiceRepository, Repository,
    TechnicianRepository, VehicleRepository, WorkOrderRepository,
};
use crate::services::notification_service::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<EnvironmentConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        config: EnvironmentConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn customers(&self) -> CustomerRepository {
        Repository::new(self.store.clone())
    }

    pub fn vehicles(&self) -> VehicleRepository {
        Repository::new(self.store.clone())
    }

    pub fn technicians(&self) -> TechnicianRepository {
        Repository::new(self.store.clone())
    }

    pub fn work_orders(&self) -> WorkOrderRepository {
        Repository::new(self.store.clone())
    }

    pub fn appointments(&self) -> AppointmentRepository {
        Repository::new(self.store.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        Repository::new(self.store.clone())
    }
}
