//! Utilidades del sistema
//!
//! Manejo de errores, validación, extractores HTTP y redondeo de importes.

pub mod errors;
pub mod extract;
pub mod money;
pub mod validation;
