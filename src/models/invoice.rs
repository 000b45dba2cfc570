//! Modelo de Invoice
//!
//! Una factura es una foto del work order al momento de facturar: las líneas
//! se copian, no se referencian.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Document;
use crate::database::Collection;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Part,
    Labor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Issued,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub work_order_id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub line_items: Vec<InvoiceLineItem>,
    pub parts_subtotal: Decimal,
    pub labor_subtotal: Decimal,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Invoice {
    const COLLECTION: Collection = Collection::Invoices;
    const RESOURCE: &'static str = "Invoice";

    fn id(&self) -> Uuid {
        self.id
    }
}
