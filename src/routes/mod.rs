//! Rutas HTTP
//!
//! Un router por recurso, todos anidados bajo `/api`.

pub mod appointment_routes;
pub mod customer_routes;
pub mod invoice_routes;
pub mod search_routes;
pub mod technician_routes;
pub mod vehicle_routes;
pub mod work_order_routes;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::json;

use crate::state::AppState;
use crate::utils::errors::AppError;

/// Router de la API con todos los recursos
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/customers", customer_routes::create_customer_router())
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/technicians", technician_routes::create_technician_router())
        .nest("/work-orders", work_order_routes::create_work_order_router())
        .nest("/appointments", appointment_routes::create_appointment_router())
        .nest("/invoices", invoice_routes::create_invoice_router())
        .nest("/search", search_routes::create_search_router())
}

/// Health check: el servidor responde y el almacén también
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "auto-shop-crm",
                "version": env!("CARGO_PKG_VERSION"),
                "storage": "ok",
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::error!("❌ Health check: almacén no disponible: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": "auto-shop-crm",
                    "version": env!("CARGO_PKG_VERSION"),
                    "storage": "unavailable",
                    "timestamp": timestamp,
                })),
            )
        }
    }
}

/// Rutas desconocidas: 404 con el mismo formato que el resto de errores
pub async fn not_found_fallback(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route '{}' not found", uri.path()))
}
