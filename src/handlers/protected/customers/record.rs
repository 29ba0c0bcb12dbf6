use axum::{
    extract::{Path, State},
    Extension,
};

use crate::api::ApiJson;
use crate::database::models::Customer;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::services::CustomerRequest;
use crate::state::AppState;

// The id stays a string here; an unparsable id is a 404, not a 400.

/// GET /customers/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult<Customer> {
    let customer = state.customers().show(&current.actor, &id).await?;
    Ok(ApiResponse::success(customer, "Customer retrieved successfully"))
}

/// PUT /customers/:id - replace only the fields present in the body
pub async fn put(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CustomerRequest>,
) -> ApiResult<Customer> {
    let customer = state.customers().update(&current.actor, &id, body).await?;
    Ok(ApiResponse::success(customer, "Customer updated"))
}

/// DELETE /customers/:id - hard delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.customers().delete(&current.actor, &id).await?;
    Ok(ApiResponse::message("Customer deleted"))
}
