use chrono::Utc;
use uuid::Uuid;

use crate::dto::{
    ApiResponse, CreateCustomerRequest, CustomerDetail, ListQuery, UpdateCustomerRequest,
};
use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::models::{Customer, Vehicle, WorkOrder};
use crate::repositories::{CustomerRepository, VehicleRepository, WorkOrderRepository};
use crate::state::AppState;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::validation::normalize_optional;

const SEARCH_FIELDS: &[&str] = &["firstName", "lastName", "email", "phone"];

pub struct CustomerController {
    customers: CustomerRepository,
    vehicles: VehicleRepository,
    work_orders: WorkOrderRepository,
}

impl CustomerController {
    pub fn new(state: &AppState) -> Self {
        Self {
            customers: state.customers(),
            vehicles: state.vehicles(),
            work_orders: state.work_orders(),
        }
    }

    pub async fn list(&self, query: ListQuery) -> Result<Vec<Customer>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .search(SEARCH_FIELDS, query.q.as_deref())
            .page(Some(limit), Some(offset));
        self.customers.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CustomerDetail, AppError> {
        let customer = self.customers.get(id).await?;
        let vehicles = self.vehicles_of(id).await?;
        Ok(CustomerDetail { customer, vehicles })
    }

    pub async fn create(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ApiResponse<Customer>, AppError> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: normalize_optional(request.email).map(|e| e.to_lowercase()),
            phone: normalize_optional(request.phone),
            address: request.address,
            communication_preference: request.communication_preference.unwrap_or_default(),
            notes: normalize_optional(request.notes),
            created_at: now,
            updated_at: now,
        };

        self.customers.create(&customer).await?;
        log::info!("👤 Cliente creado: {} ({})", customer.full_name(), customer.id);

        Ok(ApiResponse::success_with_message(
            customer,
            "Customer created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<ApiResponse<Customer>, AppError> {
        let mut customer = self.customers.get(id).await?;

        if let Some(first_name) = request.first_name {
            customer.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            customer.last_name = last_name.trim().to_string();
        }
        if request.email.is_some() {
            customer.email = normalize_optional(request.email).map(|e| e.to_lowercase());
        }
        if request.phone.is_some() {
            customer.phone = normalize_optional(request.phone);
        }
        if let Some(address) = request.address {
            customer.address = Some(address);
        }
        if let Some(preference) = request.communication_preference {
            customer.communication_preference = preference;
        }
        if request.notes.is_some() {
            customer.notes = normalize_optional(request.notes);
        }
        customer.updated_at = Utc::now();

        self.customers.update(&customer).await?;
        Ok(ApiResponse::success_with_message(
            customer,
            "Customer updated successfully",
        ))
    }

    /// Sólo se borran clientes sin vehículos ni work orders
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.customers.get(id).await?;

        let owned = DocumentFilter::new()
            .eq("customerId", id.to_string())
            .page(Some(1), None);
        if !self.vehicles.find(&owned).await?.is_empty() {
            return Err(conflict_error(
                "Customer still has vehicles; delete or transfer them first",
            ));
        }
        if !self.work_orders.find(&owned).await?.is_empty() {
            return Err(conflict_error("Customer has work orders and cannot be deleted"));
        }

        self.customers.delete(id).await?;
        log::info!("🗑️ Cliente {} eliminado", id);
        Ok(())
    }

    pub async fn vehicles(&self, id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        self.customers.get(id).await?;
        self.vehicles_of(id).await
    }

    pub async fn work_orders(&self, id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        self.customers.get(id).await?;
        let filter = DocumentFilter::new().eq("customerId", id.to_string());
        self.work_orders.find(&filter).await
    }

    async fn vehicles_of(&self, customer_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let filter = DocumentFilter::new().eq("customerId", customer_id.to_string());
        self.vehicles.find(&filter).await
    }
}
