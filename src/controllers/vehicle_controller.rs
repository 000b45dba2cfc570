use chrono::Utc;
use uuid::Uuid;

use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::dto::{
    ApiResponse, CreateVehicleRequest, MileageReadingRequest, UpdateVehicleRequest,
    VehicleDetail, VehicleQuery, WorkOrderSummary,
};
use crate::models::{Vehicle, WorkOrder};
use crate::repositories::{CustomerRepository, VehicleRepository, WorkOrderRepository};
use crate::services::MileageService;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, validation_error, AppError};
use crate::utils::validation::{normalize_optional, validate_vehicle_year};

const SEARCH_FIELDS: &[&str] = &["make", "model", "vin", "licensePlate"];

fn check_year(year: i32) -> Result<(), AppError> {
    validate_vehicle_year(year)
        .map_err(|_| validation_error("year", &format!("Year {} is not a valid model year", year)))
}

fn normalize_vin(vin: Option<String>) -> Option<String> {
    normalize_optional(vin).map(|v| v.to_uppercase())
}

pub struct VehicleController {
    vehicles: VehicleRepository,
    customers: CustomerRepository,
    work_orders: WorkOrderRepository,
    mileage: MileageService,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: state.vehicles(),
            customers: state.customers(),
            work_orders: state.work_orders(),
            mileage: MileageService::new(state.vehicles()),
        }
    }

    pub async fn list(&self, query: VehicleQuery) -> Result<Vec<Vehicle>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .eq_opt("customerId", query.customer_id.map(|id| id.to_string()))
            .search(SEARCH_FIELDS, query.q.as_deref())
            .page(Some(limit), Some(offset));
        self.vehicles.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleDetail, AppError> {
        let vehicle = self.vehicles.get(id).await?;
        let customer = self.customers.find_by_id(vehicle.customer_id).await?;
        let service_records = self
            .history_of(id)
            .await?
            .iter()
            .map(WorkOrderSummary::from)
            .collect();

        Ok(VehicleDetail {
            vehicle,
            customer,
            service_records,
        })
    }

    pub async fn create(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        check_year(request.year)?;
        // El dueño tiene que existir
        self.customers.get(request.customer_id).await?;

        let vin = normalize_vin(request.vin);
        self.ensure_vin_available(vin.as_deref(), None).await?;

        let now = Utc::now();
        let mut vehicle = Vehicle {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            year: request.year,
            make: request.make.trim().to_string(),
            model: request.model.trim().to_string(),
            vin,
            license_plate: normalize_optional(request.license_plate).map(|p| p.to_uppercase()),
            color: normalize_optional(request.color),
            current_mileage: 0,
            mileage_history: Vec::new(),
            service_history: Vec::new(),
            notes: normalize_optional(request.notes),
            created_at: now,
            updated_at: now,
        };
        if let Some(mileage) = request.mileage {
            vehicle.add_manual_reading(mileage, now);
        }

        self.vehicles.create(&vehicle).await?;
        log::info!("🚗 Vehículo creado: {} ({})", vehicle.display_name(), vehicle.id);

        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehicle created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        let mut vehicle = self.vehicles.get(id).await?;

        if let Some(customer_id) = request.customer_id {
            if customer_id != vehicle.customer_id {
                self.customers.get(customer_id).await?;
                log::info!(
                    "🔁 Vehículo {} transferido de {} a {}",
                    id,
                    vehicle.customer_id,
                    customer_id
                );
                vehicle.customer_id = customer_id;
            }
        }
        if let Some(year) = request.year {
            check_year(year)?;
            vehicle.year = year;
        }
        if let Some(make) = request.make {
            vehicle.make = make.trim().to_string();
        }
        if let Some(model) = request.model {
            vehicle.model = model.trim().to_string();
        }
        if request.vin.is_some() {
            let vin = normalize_vin(request.vin);
            self.ensure_vin_available(vin.as_deref(), Some(id)).await?;
            vehicle.vin = vin;
        }
        if request.license_plate.is_some() {
            vehicle.license_plate =
                normalize_optional(request.license_plate).map(|p| p.to_uppercase());
        }
        if request.color.is_some() {
            vehicle.color = normalize_optional(request.color);
        }
        if request.notes.is_some() {
            vehicle.notes = normalize_optional(request.notes);
        }
        vehicle.updated_at = Utc::now();

        self.vehicles.update(&vehicle).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehicle updated successfully",
        ))
    }

    /// Un vehículo con work orders no se borra: es su historial de servicio
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.vehicles.get(id).await?;

        let filter = DocumentFilter::new()
            .eq("vehicleId", id.to_string())
            .page(Some(1), None);
        if !self.work_orders.find(&filter).await?.is_empty() {
            return Err(conflict_error(
                "Vehicle has work orders and cannot be deleted",
            ));
        }

        self.vehicles.delete(id).await?;
        log::info!("🗑️ Vehículo {} eliminado", id);
        Ok(())
    }

    pub async fn record_mileage(
        &self,
        id: Uuid,
        request: MileageReadingRequest,
    ) -> Result<ApiResponse<Vehicle>, AppError> {
        let vehicle = self
            .mileage
            .record_manual_reading(id, request.mileage, request.recorded_at)
            .await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Mileage recorded successfully",
        ))
    }

    pub async fn work_orders(&self, id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        self.vehicles.get(id).await?;
        self.history_of(id).await
    }

    async fn history_of(&self, vehicle_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        let filter = DocumentFilter::new().eq("vehicleId", vehicle_id.to_string());
        self.work_orders.find(&filter).await
    }

    async fn ensure_vin_available(&self, vin: Option<&str>, except: Option<Uuid>) -> Result<(), AppError> {
        let Some(vin) = vin else {
            return Ok(());
        };
        let filter = DocumentFilter::new().eq("vin", vin);
        let taken = self
            .vehicles
            .find(&filter)
            .await?
            .into_iter()
            .any(|v| Some(v.id) != except);
        if taken {
            return Err(conflict_error(format!(
                "A vehicle with VIN '{}' already exists",
                vin
            )));
        }
        Ok(())
    }
}
