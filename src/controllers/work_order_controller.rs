use chrono::Utc;
use uuid::Uuid;

use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::dto::{
    services_from_text, ApiResponse, CreateWorkOrderRequest, GeneratedInvoice,
    UpdateWorkOrderRequest, WorkOrderDetail, WorkOrderQuery,
};
use crate::models::{Appointment, Vehicle, WorkOrder, WorkOrderStatus};
use crate::repositories::{
    AppointmentRepository, CustomerRepository, InvoiceRepository, TechnicianRepository,
    VehicleRepository, WorkOrderRepository,
};
use crate::services::work_order_pipeline::{ensure_editable, ensure_manual_status};
use crate::services::{InvoiceService, MileageService, WorkOrderPipeline};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, conflict_error, AppError};
use crate::utils::validation::normalize_optional;

const SEARCH_FIELDS: &[&str] = &["serviceRequested", "diagnosticNotes"];

/// Cargar el vehículo y comprobar que es del cliente
pub(crate) async fn vehicle_of_customer(
    vehicles: &VehicleRepository,
    vehicle_id: Uuid,
    customer_id: Uuid,
) -> Result<Vehicle, AppError> {
    let vehicle = vehicles.get(vehicle_id).await?;
    if vehicle.customer_id != customer_id {
        return Err(bad_request_error(format!(
            "Vehicle '{}' does not belong to customer '{}'",
            vehicle_id, customer_id
        )));
    }
    Ok(vehicle)
}

/// Comprobar que el técnico existe y está activo
pub(crate) async fn ensure_active_technician(
    technicians: &TechnicianRepository,
    technician_id: Uuid,
) -> Result<(), AppError> {
    let technician = technicians.get(technician_id).await?;
    if !technician.active {
        return Err(bad_request_error(format!(
            "Technician '{}' is not active",
            technician.full_name()
        )));
    }
    Ok(())
}

fn ensure_same_customer(appointment: &Appointment, customer_id: Uuid) -> Result<(), AppError> {
    if appointment.customer_id != customer_id {
        return Err(bad_request_error(format!(
            "Appointment '{}' belongs to a different customer",
            appointment.id
        )));
    }
    Ok(())
}

pub struct WorkOrderController {
    state: AppState,
    work_orders: WorkOrderRepository,
    customers: CustomerRepository,
    vehicles: VehicleRepository,
    technicians: TechnicianRepository,
    appointments: AppointmentRepository,
    invoices: InvoiceRepository,
}

impl WorkOrderController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            work_orders: state.work_orders(),
            customers: state.customers(),
            vehicles: state.vehicles(),
            technicians: state.technicians(),
            appointments: state.appointments(),
            invoices: state.invoices(),
        }
    }

    fn pipeline(&self) -> WorkOrderPipeline {
        WorkOrderPipeline::new(&self.state)
    }

    pub async fn list(&self, query: WorkOrderQuery) -> Result<Vec<WorkOrder>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .eq_opt("status", query.status.map(|s| s.as_str()))
            .eq_opt("customerId", query.customer_id.map(|id| id.to_string()))
            .eq_opt("vehicleId", query.vehicle_id.map(|id| id.to_string()))
            .eq_opt(
                "assignedTechnicianId",
                query.technician_id.map(|id| id.to_string()),
            )
            .search(SEARCH_FIELDS, query.q.as_deref())
            .page(Some(limit), Some(offset));
        self.work_orders.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<WorkOrderDetail, AppError> {
        let work_order = self.work_orders.get(id).await?;

        let customer = self.customers.find_by_id(work_order.customer_id).await?;
        let vehicle = self.vehicles.find_by_id(work_order.vehicle_id).await?;
        let technician = match work_order.assigned_technician_id {
            Some(technician_id) => self.technicians.find_by_id(technician_id).await?,
            None => None,
        };
        let appointment = match work_order.appointment_id {
            Some(appointment_id) => self.appointments.find_by_id(appointment_id).await?,
            None => None,
        };
        let invoice = match work_order.invoice_id {
            Some(invoice_id) => self.invoices.find_by_id(invoice_id).await?,
            None => None,
        };

        Ok(WorkOrderDetail {
            work_order,
            customer,
            vehicle,
            technician,
            appointment,
            invoice,
        })
    }

    pub async fn create(
        &self,
        request: CreateWorkOrderRequest,
    ) -> Result<ApiResponse<WorkOrder>, AppError> {
        self.customers.get(request.customer_id).await?;
        vehicle_of_customer(&self.vehicles, request.vehicle_id, request.customer_id).await?;
        if let Some(technician_id) = request.assigned_technician_id {
            ensure_active_technician(&self.technicians, technician_id).await?;
        }

        let mut order = WorkOrder::new(
            request.customer_id,
            request.vehicle_id,
            request.date.unwrap_or_else(Utc::now),
        );
        order.status = request.status.unwrap_or_default();
        order.services = if request.services.is_empty() {
            services_from_text(request.service_requested.as_deref().unwrap_or_default())
        } else {
            request.services
        };
        order.parts = request.parts;
        order.labor = request.labor;
        order.diagnostic_notes = normalize_optional(request.diagnostic_notes);
        order.mileage = request.mileage;
        order.assigned_technician_id = request.assigned_technician_id;

        if let Some(appointment_id) = request.appointment_id {
            let appointment = self.appointments.get(appointment_id).await?;
            ensure_same_customer(&appointment, order.customer_id)?;
            if appointment.work_order_id.is_some() {
                return Err(conflict_error(format!(
                    "Appointment '{}' already has a work order",
                    appointment_id
                )));
            }
            order.appointment_id = Some(appointment_id);
        }

        let order = self.pipeline().create(order).await?;
        self.link_appointment(&order).await?;
        log::info!("🔧 Work order creado: {} ({})", order.id, order.service_requested);

        Ok(ApiResponse::success_with_message(
            order,
            "Work order created successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateWorkOrderRequest,
    ) -> Result<ApiResponse<WorkOrder>, AppError> {
        let previous = self.work_orders.get(id).await?;
        ensure_editable(&previous)?;

        let mut order = previous.clone();

        if let Some(status) = request.status {
            ensure_manual_status(status)?;
            order.status = status;
        }
        if let Some(vehicle_id) = request.vehicle_id {
            vehicle_of_customer(&self.vehicles, vehicle_id, order.customer_id).await?;
            order.vehicle_id = vehicle_id;
        }
        if let Some(date) = request.date {
            order.date = date;
        }
        match (request.services, request.service_requested) {
            (Some(services), _) => order.services = services,
            (None, Some(text)) => order.services = services_from_text(&text),
            (None, None) => {}
        }
        if let Some(parts) = request.parts {
            order.parts = parts;
        }
        if let Some(labor) = request.labor {
            order.labor = labor;
        }
        if let Some(notes) = request.diagnostic_notes {
            order.diagnostic_notes = normalize_optional(notes);
        }
        if let Some(mileage) = request.mileage {
            order.mileage = mileage;
        }
        if let Some(technician_id) = request.assigned_technician_id {
            if let Some(technician_id) = technician_id {
                ensure_active_technician(&self.technicians, technician_id).await?;
            }
            order.assigned_technician_id = technician_id;
        }
        if let Some(appointment_id) = request.appointment_id {
            if let Some(appointment_id) = appointment_id {
                let appointment = self.appointments.get(appointment_id).await?;
                ensure_same_customer(&appointment, order.customer_id)?;
                if appointment.work_order_id.is_some_and(|linked| linked != id) {
                    return Err(conflict_error(format!(
                        "Appointment '{}' already has a work order",
                        appointment_id
                    )));
                }
            }
            order.appointment_id = appointment_id;
        }

        let order = self.pipeline().save(&previous, order).await?;

        if previous.vehicle_id != order.vehicle_id {
            MileageService::new(self.vehicles.clone())
                .move_work_order(&previous)
                .await?;
        }
        if previous.appointment_id != order.appointment_id {
            self.unlink_appointment(&previous).await?;
            self.link_appointment(&order).await?;
        }

        Ok(ApiResponse::success_with_message(
            order,
            "Work order updated successfully",
        ))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: WorkOrderStatus,
    ) -> Result<ApiResponse<WorkOrder>, AppError> {
        let previous = self.work_orders.get(id).await?;
        ensure_editable(&previous)?;
        ensure_manual_status(status)?;

        let mut order = previous.clone();
        order.status = status;
        let order = self.pipeline().save(&previous, order).await?;

        let message = format!("Work order status updated to '{}'", order.status);
        Ok(ApiResponse::success_with_message(order, message))
    }

    /// Borrar un work order; los facturados quedan como registro contable
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let order = self.work_orders.get(id).await?;
        if order.invoice_id.is_some() {
            return Err(conflict_error(
                "Invoiced work orders cannot be deleted",
            ));
        }

        self.work_orders.delete(id).await?;
        MileageService::new(self.vehicles.clone())
            .detach_work_order(&order)
            .await?;
        self.unlink_appointment(&order).await?;

        log::info!("🗑️ Work order {} eliminado", id);
        Ok(())
    }

    pub async fn generate_invoice(&self, id: Uuid) -> Result<ApiResponse<GeneratedInvoice>, AppError> {
        let (invoice, work_order) = InvoiceService::new(&self.state).generate(id).await?;
        let message = format!("Invoice {} generated", invoice.invoice_number);
        Ok(ApiResponse::success_with_message(
            GeneratedInvoice {
                invoice,
                work_order,
            },
            message,
        ))
    }

    async fn link_appointment(&self, order: &WorkOrder) -> Result<(), AppError> {
        let Some(appointment_id) = order.appointment_id else {
            return Ok(());
        };
        if let Some(mut appointment) = self.appointments.find_by_id(appointment_id).await? {
            if appointment.work_order_id != Some(order.id) {
                appointment.work_order_id = Some(order.id);
                appointment.updated_at = Utc::now();
                self.appointments.update(&appointment).await?;
            }
        }
        Ok(())
    }

    async fn unlink_appointment(&self, order: &WorkOrder) -> Result<(), AppError> {
        let Some(appointment_id) = order.appointment_id else {
            return Ok(());
        };
        if let Some(mut appointment) = self.appointments.find_by_id(appointment_id).await? {
            if appointment.work_order_id == Some(order.id) {
                appointment.work_order_id = None;
                appointment.updated_at = Utc::now();
                self.appointments.update(&appointment).await?;
            }
        }
        Ok(())
    }
}
