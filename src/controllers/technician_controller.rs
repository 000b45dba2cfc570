use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::dto::{ApiResponse, CreateTechnicianRequest, TechnicianQuery, UpdateTechnicianRequest};
use crate::models::Technician;
use crate::repositories::{TechnicianRepository, WorkOrderRepository};
use crate::state::AppState;
use crate::utils::errors::{conflict_error, validation_error, AppError};
use crate::utils::money::round_money;
use crate::utils::validation::{normalize_optional, validate_non_negative};

const SEARCH_FIELDS: &[&str] = &["firstName", "lastName", "email"];

fn check_rate(rate: Decimal) -> Result<Decimal, AppError> {
    if validate_non_negative(rate).is_err() {
        return Err(validation_error("hourlyRate", "Hourly rate must not be negative"));
    }
    Ok(round_money(rate))
}

fn clean_specialties(specialties: Vec<String>) -> Vec<String> {
    specialties
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub struct TechnicianController {
    technicians: TechnicianRepository,
    work_orders: WorkOrderRepository,
}

impl TechnicianController {
    pub fn new(state: &AppState) -> Self {
        Self {
            technicians: state.technicians(),
            work_orders: state.work_orders(),
        }
    }

    pub async fn list(&self, query: TechnicianQuery) -> Result<Vec<Technician>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .eq_opt("active", query.active)
            .search(SEARCH_FIELDS, query.q.as_deref())
            .page(Some(limit), Some(offset));
        self.technicians.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Technician, AppError> {
        self.technicians.get(id).await
    }

    pub async fn create(
        &self,
        request: CreateTechnicianRequest,
    ) -> Result<ApiResponse<Technician>, AppError> {
        let now = Utc::now();
        let technician = Technician {
            id: Uuid::new_v4(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: normalize_optional(request.email).map(|e| e.to_lowercase()),
            phone: normalize_optional(request.phone),
            specialties: clean_specialties(request.specialties),
            hourly_rate: check_rate(request.hourly_rate)?,
            active: request.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        self.technicians.create(&technician).await?;
        log::info!("🧑‍🔧 Técnico creado: {} ({})", technician.full_name(), technician.id);

        Ok(ApiResponse::success_with_message(
            technician,
            "Technician created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateTechnicianRequest,
    ) -> Result<ApiResponse<Technician>, AppError> {
        let mut technician = self.technicians.get(id).await?;

        if let Some(first_name) = request.first_name {
            technician.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            technician.last_name = last_name.trim().to_string();
        }
        if request.email.is_some() {
            technician.email = normalize_optional(request.email).map(|e| e.to_lowercase());
        }
        if request.phone.is_some() {
            technician.phone = normalize_optional(request.phone);
        }
        if let Some(specialties) = request.specialties {
            technician.specialties = clean_specialties(specialties);
        }
        if let Some(rate) = request.hourly_rate {
            technician.hourly_rate = check_rate(rate)?;
        }
        if let Some(active) = request.active {
            technician.active = active;
        }
        technician.updated_at = Utc::now();

        self.technicians.update(&technician).await?;
        Ok(ApiResponse::success_with_message(
            technician,
            "Technician updated successfully",
        ))
    }

    /// No se borra un técnico con trabajo abierto asignado
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.technicians.get(id).await?;

        let filter = DocumentFilter::new().eq("assignedTechnicianId", id.to_string());
        let open = self
            .work_orders
            .find(&filter)
            .await?
            .iter()
            .filter(|order| order.status.is_open())
            .count();
        if open > 0 {
            return Err(conflict_error(format!(
                "Technician is assigned to {} open work order(s)",
                open
            )));
        }

        self.technicians.delete(id).await?;
        log::info!("🗑️ Técnico {} eliminado", id);
        Ok(())
    }
}
