use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use uuid::Uuid;

use crate::controllers::CustomerController;
use crate::dto::{ApiResponse, CreateCustomerRequest, CustomerDetail, ListQuery, UpdateCustomerRequest};
use crate::models::{Customer, Vehicle, WorkOrder};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiPath, ApiQuery, ValidJson};

pub fn create_customer_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/vehicles", get(list_customer_vehicles))
        .route("/:id/work-orders", get(list_customer_work_orders))
}

async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), AppError> {
    let controller = CustomerController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CustomerDetail>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(request): ValidJson<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CustomerController::new(&state);
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Customer deleted successfully")))
}

async fn list_customer_vehicles(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.vehicles(id).await?))
}

async fn list_customer_work_orders(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<WorkOrder>>, AppError> {
    let controller = CustomerController::new(&state);
    Ok(Json(controller.work_orders(id).await?))
}
