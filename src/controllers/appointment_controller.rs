use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::work_order_controller::{ensure_active_technician, vehicle_of_customer};
use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::dto::{
    services_from_text, ApiResponse, AppointmentQuery, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::models::{Appointment, WorkOrder, WorkOrderStatus};
use crate::repositories::{
    AppointmentRepository, CustomerRepository, TechnicianRepository, VehicleRepository,
    WorkOrderRepository,
};
use crate::services::work_order_pipeline::ensure_editable;
use crate::services::WorkOrderPipeline;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, conflict_error, validation_error, AppError};
use crate::utils::validation::normalize_optional;

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(validation_error("endTime", "End time must be after start time"));
    }
    Ok(())
}

/// Work orders afectados al cambiar `workOrderId` de una cita
struct Relink {
    detach: Option<WorkOrder>,
    attach: Option<WorkOrder>,
}

pub struct AppointmentController {
    state: AppState,
    appointments: AppointmentRepository,
    customers: CustomerRepository,
    vehicles: VehicleRepository,
    technicians: TechnicianRepository,
    work_orders: WorkOrderRepository,
}

impl AppointmentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            appointments: state.appointments(),
            customers: state.customers(),
            vehicles: state.vehicles(),
            technicians: state.technicians(),
            work_orders: state.work_orders(),
        }
    }

    /// Listar citas. `from`/`to` devuelven las citas que se solapan con la ventana.
    pub async fn list(&self, query: AppointmentQuery) -> Result<Vec<Appointment>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .eq_opt("technicianId", query.technician_id.map(|id| id.to_string()))
            .eq_opt("customerId", query.customer_id.map(|id| id.to_string()))
            .eq_opt(
                "status",
                query.status.map(serde_json::to_value).transpose()?,
            )
            .after("endTime", query.from)
            .before("startTime", query.to)
            .oldest_first_by("startTime")
            .page(Some(limit), Some(offset));

        self.appointments.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Appointment, AppError> {
        self.appointments.get(id).await
    }

    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<ApiResponse<Appointment>, AppError> {
        check_window(request.start_time, request.end_time)?;
        self.customers.get(request.customer_id).await?;
        if let Some(vehicle_id) = request.vehicle_id {
            vehicle_of_customer(&self.vehicles, vehicle_id, request.customer_id).await?;
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            vehicle_id: request.vehicle_id,
            technician_id: request.technician_id,
            start_time: request.start_time,
            end_time: request.end_time,
            service_type: normalize_optional(request.service_type),
            notes: normalize_optional(request.notes),
            status: request.status.unwrap_or_default(),
            work_order_id: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(technician_id) = appointment.technician_id {
            ensure_active_technician(&self.technicians, technician_id).await?;
        }
        self.ensure_no_overlap(&appointment).await?;

        self.appointments.create(&appointment).await?;
        log::info!(
            "📅 Cita creada: {} ({} - {})",
            appointment.id,
            appointment.start_time,
            appointment.end_time
        );

        Ok(ApiResponse::success_with_message(
            appointment,
            "Appointment created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<ApiResponse<Appointment>, AppError> {
        let mut appointment = self.appointments.get(id).await?;

        if let Some(vehicle_id) = request.vehicle_id {
            if let Some(vehicle_id) = vehicle_id {
                vehicle_of_customer(&self.vehicles, vehicle_id, appointment.customer_id).await?;
            }
            appointment.vehicle_id = vehicle_id;
        }
        if let Some(technician_id) = request.technician_id {
            if let Some(technician_id) = technician_id {
                if appointment.technician_id != Some(technician_id) {
                    ensure_active_technician(&self.technicians, technician_id).await?;
                }
            }
            appointment.technician_id = technician_id;
        }
        if let Some(start_time) = request.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            appointment.end_time = end_time;
        }
        check_window(appointment.start_time, appointment.end_time)?;

        if request.service_type.is_some() {
            appointment.service_type = normalize_optional(request.service_type);
        }
        if request.notes.is_some() {
            appointment.notes = normalize_optional(request.notes);
        }
        if let Some(status) = request.status {
            appointment.status = status;
        }
        let relink = match request.work_order_id {
            Some(target) if target != appointment.work_order_id => {
                Some(self.plan_relink(&appointment, target).await?)
            }
            _ => None,
        };
        if let Some(relink) = &relink {
            appointment.work_order_id = relink.attach.as_ref().map(|order| order.id);
        }

        self.ensure_no_overlap(&appointment).await?;

        appointment.updated_at = Utc::now();
        self.appointments.update(&appointment).await?;

        if let Some(relink) = relink {
            self.apply_relink(appointment.id, relink).await?;
        }

        Ok(ApiResponse::success_with_message(
            appointment,
            "Appointment updated successfully",
        ))
    }

    /// Una cita con work order se cancela en lugar de borrarse
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let appointment = self.appointments.get(id).await?;
        if let Some(work_order_id) = appointment.work_order_id {
            return Err(conflict_error(format!(
                "Appointment is linked to work order '{}'; cancel it instead",
                work_order_id
            )));
        }
        self.appointments.delete(id).await?;
        log::info!("🗑️ Cita {} eliminada", id);
        Ok(())
    }

    /// Abrir el work order de una cita. Nace `scheduled` con los datos de la cita.
    pub async fn create_work_order(&self, id: Uuid) -> Result<ApiResponse<WorkOrder>, AppError> {
        let mut appointment = self.appointments.get(id).await?;

        if appointment.work_order_id.is_some() {
            return Err(conflict_error(format!(
                "Appointment '{}' already has a work order",
                id
            )));
        }
        if !appointment.status.is_active() {
            return Err(bad_request_error(
                "Only scheduled or confirmed appointments can start a work order",
            ));
        }
        let Some(vehicle_id) = appointment.vehicle_id else {
            return Err(bad_request_error(
                "Appointment has no vehicle; set one before creating a work order",
            ));
        };
        vehicle_of_customer(&self.vehicles, vehicle_id, appointment.customer_id).await?;

        let mut order = WorkOrder::new(appointment.customer_id, vehicle_id, appointment.start_time);
        order.status = WorkOrderStatus::Scheduled;
        order.services = services_from_text(appointment.service_type.as_deref().unwrap_or_default());
        order.diagnostic_notes = appointment.notes.clone();
        order.assigned_technician_id = appointment.technician_id;
        order.appointment_id = Some(appointment.id);

        let order = WorkOrderPipeline::new(&self.state).create(order).await?;

        appointment.work_order_id = Some(order.id);
        appointment.updated_at = Utc::now();
        self.appointments.update(&appointment).await?;
        log::info!("🔧 Work order {} creado desde la cita {}", order.id, appointment.id);

        Ok(ApiResponse::success_with_message(
            order,
            "Work order created from appointment",
        ))
    }

    /// Comprobar el cambio de work order de una cita antes de escribir nada
    async fn plan_relink(
        &self,
        appointment: &Appointment,
        target: Option<Uuid>,
    ) -> Result<Relink, AppError> {
        let detach = match appointment.work_order_id {
            Some(current) => self
                .work_orders
                .find_by_id(current)
                .await?
                .filter(|order| order.appointment_id == Some(appointment.id)),
            None => None,
        };
        if let Some(order) = &detach {
            ensure_editable(order)?;
        }

        let attach = match target {
            Some(work_order_id) => {
                let order = self.work_orders.get(work_order_id).await?;
                if order.customer_id != appointment.customer_id {
                    return Err(bad_request_error(
                        "Work order belongs to a different customer",
                    ));
                }
                if let Some(other) = order.appointment_id.filter(|other| *other != appointment.id) {
                    return Err(conflict_error(format!(
                        "Work order '{}' is already linked to appointment '{}'",
                        order.id, other
                    )));
                }
                ensure_editable(&order)?;
                Some(order)
            }
            None => None,
        };

        Ok(Relink { detach, attach })
    }

    /// Reflejar el cambio de enlace en los work orders
    async fn apply_relink(&self, appointment_id: Uuid, relink: Relink) -> Result<(), AppError> {
        let pipeline = WorkOrderPipeline::new(&self.state);

        if let Some(previous) = relink.detach {
            let mut order = previous.clone();
            order.appointment_id = None;
            pipeline.save(&previous, order).await?;
        }
        if let Some(previous) = relink.attach {
            let mut order = previous.clone();
            order.appointment_id = Some(appointment_id);
            pipeline.save(&previous, order).await?;
        }

        log::info!("🔗 Enlace de work order actualizado en la cita {}", appointment_id);
        Ok(())
    }

    /// Un técnico no puede tener dos citas activas solapadas
    async fn ensure_no_overlap(&self, appointment: &Appointment) -> Result<(), AppError> {
        let Some(technician_id) = appointment.technician_id else {
            return Ok(());
        };
        if !appointment.status.is_active() {
            return Ok(());
        }

        let filter = DocumentFilter::new()
            .eq("technicianId", technician_id.to_string())
            .after("endTime", Some(appointment.start_time))
            .before("startTime", Some(appointment.end_time));
        let clash = self
            .appointments
            .find(&filter)
            .await?
            .into_iter()
            .find(|other| {
                other.id != appointment.id
                    && other.status.is_active()
                    && other.overlaps(appointment.start_time, appointment.end_time)
            });

        if let Some(other) = clash {
            return Err(conflict_error(format!(
                "Technician already has an appointment from {} to {}",
                other.start_time.to_rfc3339(),
                other.end_time.to_rfc3339()
            )));
        }
        Ok(())
    }
}
