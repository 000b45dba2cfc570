use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::AppointmentController;
use crate::dto::{ApiResponse, AppointmentQuery, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::models::{Appointment, WorkOrder};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_appointment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route(
            "/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/:id/work-order", post(create_work_order_from_appointment))
}

async fn list_appointments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let controller = AppointmentController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn create_appointment(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), AppError> {
    let controller = AppointmentController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let controller = AppointmentController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<UpdateAppointmentRequest>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    let controller = AppointmentController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AppointmentController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Appointment deleted successfully")))
}

async fn create_work_order_from_appointment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<WorkOrder>>), AppError> {
    let controller = AppointmentController::new(&state);
    let response = controller.create_work_order(id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
