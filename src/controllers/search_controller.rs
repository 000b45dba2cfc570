use crate::database::DocumentFilter;
use crate::dto::{SearchQuery, SearchResults, WorkOrderSummary, MAX_LIMIT, MIN_SEARCH_LEN};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

const DEFAULT_SEARCH_LIMIT: i64 = 10;

const CUSTOMER_FIELDS: &[&str] = &["firstName", "lastName", "email", "phone"];
const VEHICLE_FIELDS: &[&str] = &["make", "model", "vin", "licensePlate"];
const WORK_ORDER_FIELDS: &[&str] = &["serviceRequested", "diagnosticNotes"];

pub struct SearchController {
    state: AppState,
}

impl SearchController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Búsqueda global sobre clientes, vehículos y work orders
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults, AppError> {
        let term = query.q.as_deref().map(str::trim).unwrap_or_default();
        if term.chars().count() < MIN_SEARCH_LEN {
            return Err(bad_request_error(format!(
                "Search term must be at least {} characters",
                MIN_SEARCH_LEN
            )));
        }
        let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_LIMIT);

        let filter_for = |fields: &'static [&'static str]| {
            DocumentFilter::new()
                .search(fields, Some(term))
                .page(Some(limit), None)
        };

        let customers = self.state.customers().find(&filter_for(CUSTOMER_FIELDS)).await?;
        let vehicles = self.state.vehicles().find(&filter_for(VEHICLE_FIELDS)).await?;
        let work_orders = self
            .state
            .work_orders()
            .find(&filter_for(WORK_ORDER_FIELDS))
            .await?
            .iter()
            .map(WorkOrderSummary::from)
            .collect();

        log::debug!("🔍 Búsqueda '{}'", term);

        Ok(SearchResults {
            query: term.to_string(),
            customers,
            vehicles,
            work_orders,
        })
    }
}
