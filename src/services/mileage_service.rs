//! Sincronización de kilometraje e historial de servicio de vehículos

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Vehicle, WorkOrder};
use crate::repositories::VehicleRepository;
use crate::utils::errors::{bad_request_error, AppResult};

pub struct MileageService {
    vehicles: VehicleRepository,
}

impl MileageService {
    pub fn new(vehicles: VehicleRepository) -> Self {
        Self { vehicles }
    }

    /// Reflejar un work order guardado en su vehículo: lectura de odómetro
    /// y entrada en el historial de servicio. Sin kilometraje en el work
    /// order se quita la lectura que hubiera tomado antes.
    /// Un vehículo inexistente se registra en el log y se ignora.
    pub async fn sync_from_work_order(&self, order: &WorkOrder) -> AppResult<Option<Vehicle>> {
        let Some(mut vehicle) = self.vehicles.find_by_id(order.vehicle_id).await? else {
            log::warn!(
                "⚠️ Work order {} apunta a un vehículo inexistente {}",
                order.id,
                order.vehicle_id
            );
            return Ok(None);
        };

        let mut changed = vehicle.add_service(order.id);
        changed |= match order.mileage {
            Some(mileage) => vehicle.upsert_work_order_reading(order.id, mileage, order.date),
            None => vehicle.remove_work_order_reading(order.id),
        };

        if changed {
            vehicle.updated_at = Utc::now();
            self.vehicles.update(&vehicle).await?;
            log::info!(
                "🚗 Vehículo {} sincronizado (km actual: {})",
                vehicle.id,
                vehicle.current_mileage
            );
        }

        Ok(Some(vehicle))
    }

    /// Lectura manual de odómetro. No se aceptan lecturas por debajo del
    /// kilometraje actual; para corregir una lectura de work order se edita
    /// el work order.
    pub async fn record_manual_reading(
        &self,
        vehicle_id: Uuid,
        mileage: u32,
        recorded_at: Option<DateTime<Utc>>,
    ) -> AppResult<Vehicle> {
        let mut vehicle = self.vehicles.get(vehicle_id).await?;

        if mileage < vehicle.current_mileage {
            return Err(bad_request_error(format!(
                "Mileage {} is lower than the current mileage {}",
                mileage, vehicle.current_mileage
            )));
        }

        vehicle.add_manual_reading(mileage, recorded_at.unwrap_or_else(Utc::now));
        vehicle.updated_at = Utc::now();
        self.vehicles.update(&vehicle).await?;
        Ok(vehicle)
    }

    /// Quitar un work order borrado del historial de servicio.
    /// La lectura de odómetro se conserva.
    pub async fn detach_work_order(&self, order: &WorkOrder) -> AppResult<()> {
        self.release(order, false).await
    }

    /// El work order pasó a otro vehículo: el anterior pierde tanto la
    /// entrada de servicio como la lectura tomada en ese work order.
    pub async fn move_work_order(&self, previous: &WorkOrder) -> AppResult<()> {
        self.release(previous, true).await
    }

    async fn release(&self, order: &WorkOrder, drop_reading: bool) -> AppResult<()> {
        let Some(mut vehicle) = self.vehicles.find_by_id(order.vehicle_id).await? else {
            return Ok(());
        };

        let mut changed = vehicle.remove_service(order.id);
        if drop_reading {
            changed |= vehicle.remove_work_order_reading(order.id);
        }

        if changed {
            vehicle.updated_at = Utc::now();
            self.vehicles.update(&vehicle).await?;
            log::info!(
                "🚗 Work order {} desvinculado del vehículo {} (km actual: {})",
                order.id,
                vehicle.id,
                vehicle.current_mileage
            );
        }
        Ok(())
    }
}
