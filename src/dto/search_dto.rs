use serde::{Deserialize, Serialize};

use super::work_order_dto::WorkOrderSummary;
use crate::models::{Customer, Vehicle};

/// Largo mínimo del término de búsqueda
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub customers: Vec<Customer>,
    pub vehicles: Vec<Vehicle>,
    pub work_orders: Vec<WorkOrderSummary>,
}
