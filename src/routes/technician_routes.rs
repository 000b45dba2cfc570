use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use uuid::Uuid;

use crate::controllers::TechnicianController;
use crate::dto::{ApiResponse, CreateTechnicianRequest, TechnicianQuery, UpdateTechnicianRequest};
use crate::models::Technician;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_technician_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_technicians).post(create_technician))
        .route(
            "/:id",
            get(get_technician)
                .put(update_technician)
                .delete(delete_technician),
        )
}

async fn list_technicians(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TechnicianQuery>,
) -> Result<Json<Vec<Technician>>, AppError> {
    let controller = TechnicianController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn create_technician(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateTechnicianRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Technician>>), AppError> {
    let controller = TechnicianController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_technician(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Technician>, AppError> {
    let controller = TechnicianController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_technician(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<UpdateTechnicianRequest>,
) -> Result<Json<ApiResponse<Technician>>, AppError> {
    let controller = TechnicianController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_technician(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = TechnicianController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Technician deleted successfully")))
}
