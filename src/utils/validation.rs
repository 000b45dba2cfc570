//! Utilidades de validación
//!
//! Funciones helper usadas por los `#[validate(custom = ...)]` de los DTOs y
//! por las validaciones manuales de líneas de work orders.

use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    // 17 caracteres, sin I, O ni Q (ISO 3779)
    static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref POSTAL_CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{2,9}$").unwrap();
    static ref LICENSE_PLATE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{0,9}$").unwrap();
}

/// Año del primer automóvil de producción
const FIRST_VEHICLE_YEAR: i32 = 1886;

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+' | '.'));
    if !allowed || clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar un VIN (se acepta en minúsculas, se normaliza al guardar)
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if !VIN_REGEX.is_match(&value.to_ascii_uppercase()) {
        let mut error = ValidationError::new("vin");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"17 characters, no I, O or Q".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !LICENSE_PLATE_REGEX.is_match(value.trim()) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar código postal (formato libre alfanumérico)
pub fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if !POSTAL_CODE_REGEX.is_match(value.trim()) {
        let mut error = ValidationError::new("postal_code");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar año de vehículo: desde 1886 hasta el año modelo siguiente
pub fn validate_vehicle_year(value: i32) -> Result<(), ValidationError> {
    let max = Utc::now().year() + 1;
    validate_range(value, FIRST_VEHICLE_YEAR, max).map_err(|mut error| {
        error.code = "vehicle_year".into();
        error
    })
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Normalizar un string opcional: recorta y convierte vacío en `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
