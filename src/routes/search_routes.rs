use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::SearchController;
use crate::dto::{SearchQuery, SearchResults};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiQuery;

pub fn create_search_router() -> Router<AppState> {
    Router::new().route("/", get(search))
}

async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let controller = SearchController::new(&state);
    Ok(Json(controller.search(query).await?))
}
