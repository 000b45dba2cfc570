use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::InvoiceController;
use crate::dto::{ApiResponse, InvoiceQuery, PaymentRequest};
use crate::models::Invoice;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_invoice_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/payment", post(record_payment))
}

async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn get_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn record_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<PaymentRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let controller = InvoiceController::new(&state);
    Ok(Json(controller.record_payment(id, request).await?))
}
