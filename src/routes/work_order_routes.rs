use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::WorkOrderController;
use crate::dto::{
    ApiResponse, CreateWorkOrderRequest, GeneratedInvoice, StatusUpdateRequest,
    UpdateWorkOrderRequest, WorkOrderDetail, WorkOrderQuery,
};
use crate::models::WorkOrder;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_work_order_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route(
            "/:id",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
        .route("/:id/status", patch(update_work_order_status))
        .route("/:id/invoice", post(generate_invoice))
}

async fn list_work_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WorkOrderQuery>,
) -> Result<Json<Vec<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn create_work_order(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkOrder>>), AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<WorkOrderDetail>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<UpdateWorkOrderRequest>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_work_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = WorkOrderController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Work order deleted successfully")))
}

async fn update_work_order_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    Ok(Json(controller.update_status(id, request.status).await?))
}

async fn generate_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedInvoice>>), AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.generate_invoice(id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
