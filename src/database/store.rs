//! Contrato del almacén de documentos
//!
//! Todas las entidades se guardan como documentos JSON agrupados por
//! colección. Los controladores nunca hablan SQL directamente: pasan por
//! `DocumentStore`, que tiene una implementación PostgreSQL (JSONB) y otra
//! en memoria.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::utils::errors::AppResult;

/// Colecciones conocidas por el sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Customers,
    Vehicles,
    Technicians,
    WorkOrders,
    Appointments,
    Invoices,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::Vehicles => "vehicles",
            Collection::Technicians => "technicians",
            Collection::WorkOrders => "work_orders",
            Collection::Appointments => "appointments",
            Collection::Invoices => "invoices",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Búsqueda de texto sobre campos de primer nivel del documento
#[derive(Debug, Clone)]
pub struct TextSearch {
    pub fields: &'static [&'static str],
    pub term: String,
}

/// Lado de la comparación en un `TimeBound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// `campo > instante`
    After,
    /// `campo < instante`
    Before,
}

/// Comparación estricta sobre un campo de fecha (RFC 3339) del documento
#[derive(Debug, Clone)]
pub struct TimeBound {
    pub field: &'static str,
    pub bound: Bound,
    pub at: DateTime<Utc>,
}

impl TimeBound {
    fn holds(&self, doc: &Value) -> bool {
        let Some(value) = doc.get(self.field).and_then(parse_time) else {
            return false;
        };
        match self.bound {
            Bound::After => value > self.at,
            Bound::Before => value < self.at,
        }
    }
}

/// Leer un campo de fecha serializado por chrono
pub fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Filtro de consulta
///
/// `equals` se evalúa como contención (todas las claves deben coincidir),
/// `search` como "contiene" sin distinguir mayúsculas en cualquiera de los
/// campos indicados. Los resultados salen del más reciente al más antiguo,
/// salvo que `order_by_time` pida orden ascendente por un campo de fecha.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub equals: Map<String, Value>,
    pub search: Option<TextSearch>,
    pub time_bounds: Vec<TimeBound>,
    pub order_by_time: Option<&'static str>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.equals.insert(field.to_string(), value.into());
        self
    }

    /// Igual que `eq`, pero sólo si el valor existe
    pub fn eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn search(mut self, fields: &'static [&'static str], term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| TextSearch {
                fields,
                term: t.to_string(),
            });
        self
    }

    /// `field > at`, si hay instante
    pub fn after(self, field: &'static str, at: Option<DateTime<Utc>>) -> Self {
        self.time_bound(field, Bound::After, at)
    }

    /// `field < at`, si hay instante
    pub fn before(self, field: &'static str, at: Option<DateTime<Utc>>) -> Self {
        self.time_bound(field, Bound::Before, at)
    }

    fn time_bound(mut self, field: &'static str, bound: Bound, at: Option<DateTime<Utc>>) -> Self {
        if let Some(at) = at {
            self.time_bounds.push(TimeBound { field, bound, at });
        }
        self
    }

    /// Ordenar de forma ascendente por un campo de fecha
    pub fn oldest_first_by(mut self, field: &'static str) -> Self {
        self.order_by_time = Some(field);
        self
    }

    pub fn page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Evaluar el filtro (sin paginación) contra un documento ya cargado
    pub fn matches(&self, doc: &Value) -> bool {
        let equals_ok = self
            .equals
            .iter()
            .all(|(key, expected)| doc.get(key) == Some(expected));

        let search_ok = match &self.search {
            None => true,
            Some(search) => {
                let needle = search.term.to_lowercase();
                search.fields.iter().any(|field| {
                    doc.get(*field)
                        .and_then(Value::as_str)
                        .map(|s| s.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        };

        equals_ok && search_ok && self.time_bounds.iter().all(|b| b.holds(doc))
    }
}

/// Almacén de documentos JSON
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insertar un documento nuevo
    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<()>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> AppResult<Option<Value>>;

    async fn find(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<Vec<Value>>;

    /// Reemplazar el documento completo. Devuelve `false` si no existía.
    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<bool>;

    /// Borrar un documento. Devuelve `false` si no existía.
    async fn delete(&self, collection: Collection, id: Uuid) -> AppResult<bool>;

    /// Comprobar que el almacén responde
    async fn ping(&self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_equality_and_search() {
        let doc = json!({
            "customerId": "abc",
            "make": "Honda",
            "model": "Civic",
        });

        let filter = DocumentFilter::new()
            .eq("customerId", "abc")
            .search(&["make", "model"], Some("civ"));
        assert!(filter.matches(&doc));

        let filter = DocumentFilter::new().eq("customerId", "other");
        assert!(!filter.matches(&doc));

        let filter = DocumentFilter::new().search(&["make"], Some("toyota"));
        assert!(!filter.matches(&doc));
    }

    #[test]
    fn test_time_bounds_are_strict() {
        let doc = json!({
            "startTime": "2030-05-01T09:00:00Z",
            "endTime": "2030-05-01T10:00:00.500Z",
        });
        let at = |s: &str| Some(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc));

        let filter = DocumentFilter::new()
            .after("endTime", at("2030-05-01T10:00:00Z"))
            .before("startTime", at("2030-05-01T12:00:00Z"));
        assert!(filter.matches(&doc));

        let filter = DocumentFilter::new().before("startTime", at("2030-05-01T09:00:00Z"));
        assert!(!filter.matches(&doc));

        let filter = DocumentFilter::new().after("missing", at("2000-01-01T00:00:00Z"));
        assert!(!filter.matches(&doc));

        let filter = DocumentFilter::new().after("endTime", None);
        assert!(filter.time_bounds.is_empty());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = DocumentFilter::new().search(&["make"], Some("   "));
        assert!(filter.search.is_none());
        assert!(filter.matches(&json!({})));
    }
}
