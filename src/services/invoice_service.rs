//! Generación de facturas a partir de work orders terminados

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::work_order_pipeline::{sum_amounts, WorkOrderPipeline};
use crate::models::{
    Invoice, InvoiceLineItem, InvoiceStatus, LineItemKind, WorkOrder, WorkOrderStatus,
};
use crate::repositories::{InvoiceRepository, WorkOrderRepository};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, conflict_error, validation_error, AppResult};
use crate::utils::money::round_money;

/// Número de factura: `INV-YYYYMMDD-XXXXXX`
pub fn invoice_number(issued_at: DateTime<Utc>, id: Uuid) -> String {
    let suffix = id.simple().to_string()[..6].to_uppercase();
    format!("INV-{}-{}", issued_at.format("%Y%m%d"), suffix)
}

/// Armar la factura de un work order. El impuesto se aplica sólo a repuestos.
pub fn build_invoice(
    order: &WorkOrder,
    tax_rate: Decimal,
    payment_terms_days: i64,
    issued_at: DateTime<Utc>,
) -> AppResult<Invoice> {
    let mut line_items = Vec::with_capacity(order.parts.len() + order.labor.len());

    for part in &order.parts {
        let description = match &part.part_number {
            Some(number) => format!("{} ({})", part.name, number),
            None => part.name.clone(),
        };
        line_items.push(InvoiceLineItem {
            kind: LineItemKind::Part,
            description,
            quantity: part.quantity,
            unit_price: part.unit_price,
            amount: line_amount("parts", part.amount())?,
        });
    }

    for labor in &order.labor {
        line_items.push(InvoiceLineItem {
            kind: LineItemKind::Labor,
            description: labor.description.clone(),
            quantity: labor.billable_hours(),
            unit_price: labor.rate,
            amount: line_amount("labor", labor.actual_amount())?,
        });
    }

    let subtotal_of = |field: &'static str, kind: LineItemKind| {
        sum_amounts(
            field,
            line_items
                .iter()
                .filter(|item| item.kind == kind)
                .map(|item| Some(item.amount)),
        )
    };
    let parts_subtotal = subtotal_of("parts", LineItemKind::Part)?;
    let labor_subtotal = subtotal_of("labor", LineItemKind::Labor)?;

    let too_large = || validation_error("total", "Invoice total is too large");
    let subtotal = parts_subtotal.checked_add(labor_subtotal).ok_or_else(too_large)?;
    let tax = round_money(parts_subtotal.checked_mul(tax_rate).ok_or_else(too_large)?);
    let total = subtotal.checked_add(tax).ok_or_else(too_large)?;

    let id = Uuid::new_v4();
    Ok(Invoice {
        id,
        invoice_number: invoice_number(issued_at, id),
        work_order_id: order.id,
        customer_id: order.customer_id,
        vehicle_id: order.vehicle_id,
        issued_at,
        due_date: issued_at + Duration::days(payment_terms_days),
        line_items,
        parts_subtotal,
        labor_subtotal,
        subtotal,
        tax_rate,
        tax,
        total,
        status: InvoiceStatus::Issued,
        paid_at: None,
        payment_method: None,
        created_at: issued_at,
        updated_at: issued_at,
    })
}

fn line_amount(field: &'static str, amount: Option<Decimal>) -> AppResult<Decimal> {
    amount
        .map(round_money)
        .ok_or_else(|| validation_error(field, "Line amount is too large"))
}

pub struct InvoiceService {
    state: AppState,
    invoices: InvoiceRepository,
    work_orders: WorkOrderRepository,
}

impl InvoiceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            invoices: state.invoices(),
            work_orders: state.work_orders(),
        }
    }

    /// Facturar un work order `completed` y pasarlo a `invoiced`
    pub async fn generate(&self, work_order_id: Uuid) -> AppResult<(Invoice, WorkOrder)> {
        let order = self.work_orders.get(work_order_id).await?;

        if order.invoice_id.is_some() || order.status == WorkOrderStatus::Invoiced {
            return Err(conflict_error(format!(
                "Work order '{}' has already been invoiced",
                order.id
            )));
        }
        if order.status != WorkOrderStatus::Completed {
            return Err(bad_request_error(format!(
                "Only completed work orders can be invoiced (current status: '{}')",
                order.status
            )));
        }

        let invoice = build_invoice(
            &order,
            self.state.config.tax_rate,
            self.state.config.payment_terms_days,
            Utc::now(),
        )?;
        self.invoices.create(&invoice).await?;

        let mut invoiced = order.clone();
        invoiced.status = WorkOrderStatus::Invoiced;
        invoiced.invoice_id = Some(invoice.id);
        let saved = match WorkOrderPipeline::new(&self.state)
            .save_invoiced(&order, invoiced, invoice.total)
            .await
        {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_unreferenced(&invoice).await;
                return Err(e);
            }
        };
        log::info!("🧾 Factura {} generada para work order {}", invoice.invoice_number, order.id);

        Ok((invoice, saved))
    }

    /// Borrar una factura recién creada si su work order no llegó a apuntarla
    async fn discard_unreferenced(&self, invoice: &Invoice) {
        let referenced = match self.work_orders.find_by_id(invoice.work_order_id).await {
            Ok(stored) => stored.is_some_and(|o| o.invoice_id == Some(invoice.id)),
            Err(e) => {
                log::error!("❌ No se pudo comprobar el work order {}: {}", invoice.work_order_id, e);
                false
            }
        };
        if referenced {
            return;
        }
        if let Err(e) = self.invoices.delete(invoice.id).await {
            log::error!(
                "❌ No se pudo borrar la factura huérfana {}: {}",
                invoice.invoice_number,
                e
            );
        }
    }

    /// Registrar el pago de una factura
    pub async fn mark_paid(&self, invoice_id: Uuid, payment_method: Option<String>) -> AppResult<Invoice> {
        let mut invoice = self.invoices.get(invoice_id).await?;
        if invoice.status == InvoiceStatus::Paid {
            return Err(conflict_error(format!(
                "Invoice '{}' is already paid",
                invoice.invoice_number
            )));
        }

        let now = Utc::now();
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(now);
        invoice.payment_method = payment_method;
        invoice.updated_at = now;
        self.invoices.update(&invoice).await?;
        Ok(invoice)
    }
}
