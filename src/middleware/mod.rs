//! Middleware del sistema
//!
//! Capas HTTP propias; el tracing y la compresión vienen de `tower-http`.

pub mod cors;

pub use cors::cors_layer;
