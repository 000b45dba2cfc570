//! Modelo de Vehicle
//!
//! Además de los datos del vehículo guarda dos historiales:
//! - `mileageHistory`: lecturas de odómetro (manuales o tomadas en un work order)
//! - `serviceHistory`: ids de work orders hechos sobre el vehículo
//!
//! `currentMileage` es siempre el máximo del historial de kilometraje.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Document;
use crate::database::Collection;

/// Origen de una lectura de odómetro
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MileageSource {
    WorkOrder,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MileageRecord {
    pub mileage: u32,
    pub recorded_at: DateTime<Utc>,
    pub source: MileageSource,
    pub work_order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub color: Option<String>,
    pub current_mileage: u32,
    #[serde(default)]
    pub mileage_history: Vec<MileageRecord>,
    #[serde(default)]
    pub service_history: Vec<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Descripción corta tipo "2018 Honda Civic"
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    /// Agregar una lectura manual
    pub fn add_manual_reading(&mut self, mileage: u32, recorded_at: DateTime<Utc>) {
        self.mileage_history.push(MileageRecord {
            mileage,
            recorded_at,
            source: MileageSource::Manual,
            work_order_id: None,
        });
        self.recompute_current_mileage();
    }

    /// Insertar o actualizar la lectura asociada a un work order.
    /// Devuelve `true` si el historial cambió.
    pub fn upsert_work_order_reading(
        &mut self,
        work_order_id: Uuid,
        mileage: u32,
        recorded_at: DateTime<Utc>,
    ) -> bool {
        let existing = self
            .mileage_history
            .iter_mut()
            .find(|r| r.work_order_id == Some(work_order_id));

        let changed = match existing {
            Some(record) if record.mileage == mileage => false,
            Some(record) => {
                record.mileage = mileage;
                record.recorded_at = recorded_at;
                true
            }
            None => {
                self.mileage_history.push(MileageRecord {
                    mileage,
                    recorded_at,
                    source: MileageSource::WorkOrder,
                    work_order_id: Some(work_order_id),
                });
                true
            }
        };

        if changed {
            self.recompute_current_mileage();
        }
        changed
    }

    /// Quitar la lectura tomada en un work order.
    /// Devuelve `true` si existía.
    pub fn remove_work_order_reading(&mut self, work_order_id: Uuid) -> bool {
        let before = self.mileage_history.len();
        self.mileage_history
            .retain(|r| r.work_order_id != Some(work_order_id));
        let removed = before != self.mileage_history.len();
        if removed {
            self.recompute_current_mileage();
        }
        removed
    }

    /// Registrar un work order en el historial de servicio.
    /// Devuelve `true` si no estaba.
    pub fn add_service(&mut self, work_order_id: Uuid) -> bool {
        if self.service_history.contains(&work_order_id) {
            return false;
        }
        self.service_history.push(work_order_id);
        true
    }

    /// Quitar un work order del historial de servicio.
    /// Devuelve `true` si estaba.
    pub fn remove_service(&mut self, work_order_id: Uuid) -> bool {
        let before = self.service_history.len();
        self.service_history.retain(|id| *id != work_order_id);
        before != self.service_history.len()
    }

    fn recompute_current_mileage(&mut self) {
        self.current_mileage = self
            .mileage_history
            .iter()
            .map(|r| r.mileage)
            .max()
            .unwrap_or(0);
    }
}

impl Document for Vehicle {
    const COLLECTION: Collection = Collection::Vehicles;
    const RESOURCE: &'static str = "Vehicle";

    fn id(&self) -> Uuid {
        self.id
    }
}
