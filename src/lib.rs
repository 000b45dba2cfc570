//! Auto Shop CRM
//!
//! Backend REST para un taller mecánico: clientes, vehículos, técnicos,
//! work orders, citas y facturación.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use middleware::cors::cors_layer;
use state::AppState;

/// Construir la aplicación completa: rutas, fallback JSON y capas HTTP
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .nest("/api", routes::create_api_router())
        .fallback(routes::not_found_fallback)
        .layer(cors_layer(&state.config.cors_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
