use axum::{extract::State, Extension};

use crate::api::ApiJson;
use crate::database::models::Customer;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::services::CustomerRequest;
use crate::state::AppState;

/// POST /customers - create a customer owned by the caller
pub async fn post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    ApiJson(body): ApiJson<CustomerRequest>,
) -> ApiResult<Customer> {
    let customer = state.customers().create(&current.actor, body).await?;
    Ok(ApiResponse::created(customer, "Customer created successfully"))
}
