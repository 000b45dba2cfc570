use uuid::Uuid;

use crate::database::DocumentFilter;
use crate::dto::common_dto::page;
use crate::dto::{ApiResponse, InvoiceQuery, PaymentRequest};
use crate::models::Invoice;
use crate::repositories::InvoiceRepository;
use crate::services::InvoiceService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::normalize_optional;

pub struct InvoiceController {
    state: AppState,
    invoices: InvoiceRepository,
}

impl InvoiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            invoices: state.invoices(),
        }
    }

    pub async fn list(&self, query: InvoiceQuery) -> Result<Vec<Invoice>, AppError> {
        let (limit, offset) = page(query.limit, query.offset);
        let filter = DocumentFilter::new()
            .eq_opt("status", query.status.map(serde_json::to_value).transpose()?)
            .eq_opt("customerId", query.customer_id.map(|id| id.to_string()))
            .eq_opt("workOrderId", query.work_order_id.map(|id| id.to_string()))
            .search(&["invoiceNumber"], query.q.as_deref())
            .page(Some(limit), Some(offset));
        self.invoices.find(&filter).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.invoices.get(id).await
    }

    pub async fn record_payment(
        &self,
        id: Uuid,
        request: PaymentRequest,
    ) -> Result<ApiResponse<Invoice>, AppError> {
        let invoice = InvoiceService::new(&self.state)
            .mark_paid(id, normalize_optional(request.payment_method))
            .await?;
        log::info!("💰 Factura {} pagada", invoice.invoice_number);
        Ok(ApiResponse::success_with_message(
            invoice,
            "Payment recorded successfully",
        ))
    }
}
