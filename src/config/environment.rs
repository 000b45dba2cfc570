//! Configuración de variables de entorno
//!
//! Este módulo lee la configuración del taller y del servidor desde el
//! entorno (cargado previamente con `dotenvy`).

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use super::database::DatabaseConfig;

/// Backend de almacenamiento de documentos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown STORAGE_BACKEND '{}'", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    // Datos del taller
    pub shop_name: String,
    pub tax_rate: Decimal,
    pub payment_terms_days: i64,
    // Pasarela de notificaciones SMS/email
    pub notification_webhook_url: Option<String>,
    pub notification_api_key: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            storage_backend: StorageBackend::Memory,
            database_url: None,
            db_max_connections: 10,
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            shop_name: "Auto Shop".to_string(),
            tax_rate: Decimal::ZERO,
            payment_terms_days: 30,
            notification_webhook_url: None,
            notification_api_key: None,
        }
    }
}

/// Leer una variable opcional; vacía cuenta como ausente
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{} must be valid: {}", name, e)),
        None => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Construir la configuración a partir del entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let database_url = optional_var("DATABASE_URL");

        let storage_backend = match optional_var("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        };

        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"));
        }

        let tax_rate: Decimal = parse_var("TAX_RATE", defaults.tax_rate)?;
        if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
            return Err(anyhow!("TAX_RATE must be a fraction between 0 and 1"));
        }

        let payment_terms_days: i64 =
            parse_var("PAYMENT_TERMS_DAYS", defaults.payment_terms_days)?;
        if payment_terms_days < 0 {
            return Err(anyhow!("PAYMENT_TERMS_DAYS must not be negative"));
        }

        Ok(Self {
            environment: optional_var("ENVIRONMENT").unwrap_or(defaults.environment),
            host: optional_var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port).context("reading PORT")?,
            storage_backend,
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level: optional_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            shop_name: optional_var("SHOP_NAME").unwrap_or(defaults.shop_name),
            tax_rate,
            payment_terms_days,
            notification_webhook_url: optional_var("NOTIFICATION_WEBHOOK_URL"),
            notification_api_key: optional_var("NOTIFICATION_API_KEY"),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuración del pool, si hay base de datos
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database_url
            .clone()
            .map(|url| DatabaseConfig::new(url, self.db_max_connections))
    }
}
