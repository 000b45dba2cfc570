use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::VehicleController;
use crate::dto::{
    ApiResponse, CreateVehicleRequest, MileageReadingRequest, UpdateVehicleRequest,
    VehicleDetail, VehicleQuery,
};
use crate::models::{Vehicle, WorkOrder};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/mileage", post(record_mileage))
        .route("/:id/work-orders", get(list_vehicle_work_orders))
}

async fn list_vehicles(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VehicleQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<VehicleDetail>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted successfully")))
}

async fn record_mileage(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<MileageReadingRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.record_mileage(id, request).await?))
}

async fn list_vehicle_work_orders(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<WorkOrder>>, AppError> {
    let controller = VehicleController::new(&state);
    Ok(Json(controller.work_orders(id).await?))
}
