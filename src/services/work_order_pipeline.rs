//! Pipeline de guardado de work orders
//!
//! Toda escritura de un work order pasa por aquí, en este orden:
//! 1. transición de estado (validada contra el grafo de estados)
//! 2. líneas validadas, `serviceRequested` y totales recalculados
//! 3. persistencia
//! 4. aviso al cliente si el estado cambió y el nuevo estado lo amerita
//! 5. sincronización de kilometraje e historial del vehículo
//!
//! Los totales se calculan antes del aviso para que el mensaje de
//! "listo para retirar" pueda citar el importe final, y el aviso sale
//! después de guardar para no avisar de escrituras que fallaron.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::mileage_service::MileageService;
use super::notification_service::{build_status_notifications, dispatch, Notifier};
use crate::models::{StatusChange, WorkOrder, WorkOrderStatus};
use crate::repositories::{CustomerRepository, VehicleRepository, WorkOrderRepository};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, conflict_error, validation_error, AppResult};
use crate::utils::money::round_money;
use crate::utils::validation::{validate_non_negative, validate_positive};

const MAX_DESCRIPTION_LEN: usize = 500;

/// Validar un cambio de estado. Mantener el mismo estado siempre es válido.
pub fn validate_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> AppResult<()> {
    if from == to || from.can_transition_to(to) {
        return Ok(());
    }
    Err(bad_request_error(format!(
        "Cannot change work order status from '{}' to '{}'",
        from, to
    )))
}

/// Un work order facturado ya no se edita
pub fn ensure_editable(order: &WorkOrder) -> AppResult<()> {
    if order.status == WorkOrderStatus::Invoiced {
        return Err(conflict_error(format!(
            "Work order '{}' has been invoiced and can no longer be modified",
            order.id
        )));
    }
    Ok(())
}

/// `invoiced` sólo se alcanza generando la factura
pub fn ensure_manual_status(status: WorkOrderStatus) -> AppResult<()> {
    if status == WorkOrderStatus::Invoiced {
        return Err(bad_request_error(
            "Work orders become 'invoiced' by generating an invoice",
        ));
    }
    Ok(())
}

/// Mantener `serviceRequested` igual a las descripciones de `services`
pub fn sync_service_requested(order: &mut WorkOrder) {
    order.service_requested = order
        .services
        .iter()
        .map(|s| s.description.trim())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
}

/// Sumar importes de línea ya redondeados; un desborde es un error de validación
pub fn sum_amounts(
    field: &'static str,
    amounts: impl IntoIterator<Item = Option<Decimal>>,
) -> AppResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| {
            amount.and_then(|a| total.checked_add(round_money(a)))
        })
        .ok_or_else(|| validation_error(field, "Line amounts are too large"))
}

/// Recalcular los totales derivados a partir de las líneas.
/// Cada línea se redondea a centavos antes de sumar, igual que en la factura.
pub fn recalculate_totals(order: &mut WorkOrder) -> AppResult<()> {
    let parts_total = sum_amounts("parts", order.parts.iter().map(|p| p.amount()))?;
    let estimated_labor = sum_amounts("labor", order.labor.iter().map(|l| l.estimated_amount()))?;
    let actual_labor = sum_amounts("labor", order.labor.iter().map(|l| l.actual_amount()))?;

    let too_large = || validation_error("parts", "Work order total is too large");
    order.total_estimate = parts_total.checked_add(estimated_labor).ok_or_else(too_large)?;
    order.total_actual = parts_total.checked_add(actual_labor).ok_or_else(too_large)?;
    order.parts_total = parts_total;
    order.labor_total = actual_labor;
    Ok(())
}

/// Validar servicios, repuestos y mano de obra
pub fn validate_lines(order: &WorkOrder) -> AppResult<()> {
    for (i, service) in order.services.iter().enumerate() {
        let description = service.description.trim();
        if description.is_empty() || description.len() > MAX_DESCRIPTION_LEN {
            return Err(validation_error(
                "services",
                &format!("Service {}: description is required (max {} chars)", i + 1, MAX_DESCRIPTION_LEN),
            ));
        }
    }

    for (i, part) in order.parts.iter().enumerate() {
        if part.name.trim().is_empty() {
            return Err(validation_error("parts", &format!("Part {}: name is required", i + 1)));
        }
        if validate_positive(part.quantity).is_err() {
            return Err(validation_error(
                "parts",
                &format!("Part {}: quantity must be positive", i + 1),
            ));
        }
        if validate_non_negative(part.unit_price).is_err() {
            return Err(validation_error(
                "parts",
                &format!("Part {}: unit price must not be negative", i + 1),
            ));
        }
    }

    for (i, line) in order.labor.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(validation_error(
                "labor",
                &format!("Labor {}: description is required", i + 1),
            ));
        }
        let negative_hours = validate_non_negative(line.hours).is_err()
            || line
                .actual_hours
                .map(|h| validate_non_negative(h).is_err())
                .unwrap_or(false);
        if negative_hours {
            return Err(validation_error(
                "labor",
                &format!("Labor {}: hours must not be negative", i + 1),
            ));
        }
        if validate_non_negative(line.rate).is_err() {
            return Err(validation_error(
                "labor",
                &format!("Labor {}: rate must not be negative", i + 1),
            ));
        }
    }

    Ok(())
}

pub struct WorkOrderPipeline {
    work_orders: WorkOrderRepository,
    customers: CustomerRepository,
    vehicles: VehicleRepository,
    mileage: MileageService,
    notifier: Arc<dyn Notifier>,
    shop_name: String,
}

impl WorkOrderPipeline {
    pub fn new(state: &AppState) -> Self {
        Self {
            work_orders: state.work_orders(),
            customers: state.customers(),
            vehicles: state.vehicles(),
            mileage: MileageService::new(state.vehicles()),
            notifier: state.notifier.clone(),
            shop_name: state.config.shop_name.clone(),
        }
    }

    /// Guardar un work order nuevo. Sólo puede nacer `created` o `scheduled`.
    pub async fn create(&self, order: WorkOrder) -> AppResult<WorkOrder> {
        self.run(None, order, None).await
    }

    /// Guardar cambios sobre `previous`
    pub async fn save(&self, previous: &WorkOrder, order: WorkOrder) -> AppResult<WorkOrder> {
        self.run(Some(previous), order, None).await
    }

    /// Guardar el paso a `invoiced`; el aviso cita el total de la factura
    pub async fn save_invoiced(
        &self,
        previous: &WorkOrder,
        order: WorkOrder,
        amount_due: Decimal,
    ) -> AppResult<WorkOrder> {
        self.run(Some(previous), order, Some(amount_due)).await
    }

    async fn run(
        &self,
        previous: Option<&WorkOrder>,
        mut order: WorkOrder,
        amount_due: Option<Decimal>,
    ) -> AppResult<WorkOrder> {
        let now = Utc::now();

        let status_changed = match previous {
            Some(prev) => {
                validate_transition(prev.status, order.status)?;
                prev.status != order.status
            }
            None => {
                if !matches!(order.status, WorkOrderStatus::Created | WorkOrderStatus::Scheduled) {
                    return Err(bad_request_error(format!(
                        "A new work order cannot start as '{}'",
                        order.status
                    )));
                }
                true
            }
        };

        if status_changed {
            order.status_history.push(StatusChange {
                status: order.status,
                changed_at: now,
            });
            if order.status == WorkOrderStatus::Completed {
                order.completed_at = Some(now);
            } else if order.status.is_open() {
                order.completed_at = None;
            }
        }

        validate_lines(&order)?;
        sync_service_requested(&mut order);
        recalculate_totals(&mut order)?;
        order.updated_at = now;

        match previous {
            Some(_) => self.work_orders.update(&order).await?,
            None => self.work_orders.create(&order).await?,
        }

        if let Some(prev) = previous.filter(|_| status_changed) {
            log::info!("🔧 Work order {}: {} -> {}", order.id, prev.status, order.status);
        }

        if status_changed && order.status.notifies_customer() {
            self.notify(&order, amount_due).await;
        }

        self.mileage.sync_from_work_order(&order).await?;

        Ok(order)
    }

    async fn notify(&self, order: &WorkOrder, amount_due: Option<Decimal>) {
        let customer = match self.customers.find_by_id(order.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                log::warn!("⚠️ Sin cliente {} para avisar del work order {}", order.customer_id, order.id);
                return;
            }
            Err(e) => {
                log::error!("❌ Error cargando cliente para aviso: {}", e);
                return;
            }
        };

        let vehicle = match self.vehicles.find_by_id(order.vehicle_id).await {
            Ok(vehicle) => vehicle,
            Err(e) => {
                log::warn!("⚠️ Aviso sin datos del vehículo: {}", e);
                None
            }
        };

        let notifications =
            build_status_notifications(&self.shop_name, &customer, vehicle.as_ref(), order, amount_due);
        let delivered = dispatch(self.notifier.as_ref(), &notifications).await;
        log::info!(
            "📨 Work order {} ({}): {}/{} avisos entregados",
            order.id,
            order.status,
            delivered,
            notifications.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;
    use crate::database::MemoryDocumentStore;
    use crate::models::{
        CommunicationPreference, Customer, LaborLine, PartLine, ServiceLine, Vehicle,
    };
    use crate::services::notification_service::{Notification, NotificationError};
    use crate::utils::errors::AppError;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Unavailable("down".into()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn order_with_lines() -> WorkOrder {
        let mut order = WorkOrder::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
        order.services = vec![
            ServiceLine { description: "Oil change".into(), completed: false },
            ServiceLine { description: " Brake inspection ".into(), completed: false },
        ];
        order.parts = vec![
            PartLine { part_number: Some("OF-1".into()), name: "Oil filter".into(), quantity: dec("1"), unit_price: dec("12.99") },
            PartLine { part_number: None, name: "5W-30 oil".into(), quantity: dec("4.5"), unit_price: dec("7.333") },
        ];
        order.labor = vec![
            LaborLine { description: "Oil change".into(), hours: dec("0.5"), actual_hours: None, rate: dec("120"), technician_id: None },
            LaborLine { description: "Brakes".into(), hours: dec("1.5"), actual_hours: Some(dec("2")), rate: dec("120"), technician_id: None },
        ];
        order
    }

    async fn setup(fail: bool) -> (AppState, Arc<RecordingNotifier>, Customer, Vehicle) {
        let notifier = Arc::new(RecordingNotifier { fail, ..Default::default() });
        let state = AppState::new(
            Arc::new(MemoryDocumentStore::new()),
            notifier.clone(),
            EnvironmentConfig::default(),
        );
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            first_name: "Marta".into(),
            last_name: "Ruiz".into(),
            email: None,
            phone: Some("555-000-1111".into()),
            address: None,
            communication_preference: CommunicationPreference::Sms,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            year: 2019,
            make: "Ford".into(),
            model: "Focus".into(),
            vin: None,
            license_plate: None,
            color: None,
            current_mileage: 0,
            mileage_history: Vec::new(),
            service_history: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.customers().create(&customer).await.unwrap();
        state.vehicles().create(&vehicle).await.unwrap();
        (state, notifier, customer, vehicle)
    }

    #[test]
    fn test_transition_table() {
        use WorkOrderStatus::*;
        assert!(validate_transition(Created, InProgress).is_ok());
        assert!(validate_transition(InProgress, Completed).is_ok());
        assert!(validate_transition(Completed, InProgress).is_ok());
        assert!(validate_transition(Completed, Completed).is_ok());
        assert!(validate_transition(Created, Completed).is_err());
        assert!(validate_transition(Cancelled, InProgress).is_err());
        assert!(validate_transition(Invoiced, Completed).is_err());
    }

    #[test]
    fn test_totals_equal_sum_of_lines() {
        let mut order = order_with_lines();
        recalculate_totals(&mut order).unwrap();

        // 12.99 + round(4.5 * 7.333 = 32.9985) = 12.99 + 33.00
        assert_eq!(order.parts_total, dec("45.99"));
        // 0.5*120 + 2*120
        assert_eq!(order.labor_total, dec("300"));
        assert_eq!(order.total_estimate, dec("45.99") + dec("240"));
        assert_eq!(order.total_actual, dec("345.99"));
    }

    #[test]
    fn test_service_requested_is_joined_and_trimmed() {
        let mut order = order_with_lines();
        order.services.push(ServiceLine { description: "   ".into(), completed: false });
        sync_service_requested(&mut order);
        assert_eq!(order.service_requested, "Oil change, Brake inspection");
    }

    #[test]
    fn test_line_validation() {
        let mut order = order_with_lines();
        order.parts[0].quantity = Decimal::ZERO;
        assert!(matches!(validate_lines(&order), Err(AppError::Validation(_))));

        let mut order = order_with_lines();
        order.labor[1].actual_hours = Some(dec("-1"));
        assert!(validate_lines(&order).is_err());

        assert!(validate_lines(&order_with_lines()).is_ok());
    }

    #[test]
    fn test_overflowing_lines_are_a_validation_error() {
        let mut order = order_with_lines();
        order.parts[0].quantity = dec("100000000000000000000");
        order.parts[0].unit_price = dec("100000000000000000000");
        assert!(validate_lines(&order).is_ok());
        assert!(matches!(recalculate_totals(&mut order), Err(AppError::Validation(_))));

        // Cada línea cabe pero la suma no
        let mut order = order_with_lines();
        order.parts[0].quantity = dec("1");
        order.parts[0].unit_price = dec("70000000000000000000000000000");
        order.parts[1].quantity = dec("1");
        order.parts[1].unit_price = dec("70000000000000000000000000000");
        assert!(recalculate_totals(&mut order).is_err());
    }

    #[tokio::test]
    async fn test_create_runs_all_side_effects() {
        let (state, notifier, customer, vehicle) = setup(false).await;
        let pipeline = WorkOrderPipeline::new(&state);

        let mut order = order_with_lines();
        order.customer_id = customer.id;
        order.vehicle_id = vehicle.id;
        order.mileage = Some(64_000);

        let saved = pipeline.create(order).await.unwrap();
        assert_eq!(saved.total_actual, dec("345.99"));
        assert_eq!(saved.status_history.len(), 1);

        let stored_vehicle = state.vehicles().get(vehicle.id).await.unwrap();
        assert_eq!(stored_vehicle.current_mileage, 64_000);
        assert_eq!(stored_vehicle.service_history, vec![saved.id]);

        // `created` no avisa
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_change_notifies_and_sets_completed_at() {
        let (state, notifier, customer, vehicle) = setup(false).await;
        let pipeline = WorkOrderPipeline::new(&state);

        let mut order = order_with_lines();
        order.customer_id = customer.id;
        order.vehicle_id = vehicle.id;
        let created = pipeline.create(order).await.unwrap();

        let mut next = created.clone();
        next.status = WorkOrderStatus::InProgress;
        let in_progress = pipeline.save(&created, next).await.unwrap();

        let mut next = in_progress.clone();
        next.status = WorkOrderStatus::Completed;
        let completed = pipeline.save(&in_progress, next).await.unwrap();

        assert!(completed.completed_at.is_some());
        assert_eq!(completed.status_history.len(), 3);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].body.contains("ready for pickup"));
        assert!(sent[1].body.contains("2019 Ford Focus"));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_save() {
        let (state, _, customer, vehicle) = setup(true).await;
        let pipeline = WorkOrderPipeline::new(&state);

        let mut order = order_with_lines();
        order.customer_id = customer.id;
        order.vehicle_id = vehicle.id;
        let created = pipeline.create(order).await.unwrap();

        let mut next = created.clone();
        next.status = WorkOrderStatus::InProgress;
        let saved = pipeline.save(&created, next).await.unwrap();

        let stored = state.work_orders().get(saved.id).await.unwrap();
        assert_eq!(stored.status, WorkOrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_not_persisted() {
        let (state, _, customer, vehicle) = setup(false).await;
        let pipeline = WorkOrderPipeline::new(&state);

        let mut order = order_with_lines();
        order.customer_id = customer.id;
        order.vehicle_id = vehicle.id;
        let created = pipeline.create(order).await.unwrap();

        let mut next = created.clone();
        next.status = WorkOrderStatus::Completed;
        let err = pipeline.save(&created, next).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let stored = state.work_orders().get(created.id).await.unwrap();
        assert_eq!(stored.status, WorkOrderStatus::Created);
    }

    #[tokio::test]
    async fn test_new_order_cannot_start_completed() {
        let (state, _, customer, vehicle) = setup(false).await;
        let pipeline = WorkOrderPipeline::new(&state);

        let mut order = WorkOrder::new(customer.id, vehicle.id, Utc::now());
        order.status = WorkOrderStatus::Completed;
        assert!(pipeline.create(order).await.is_err());
    }
}
