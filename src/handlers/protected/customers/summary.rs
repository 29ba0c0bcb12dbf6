use axum::{extract::State, Extension};
use chrono::Utc;

use crate::database::models::CustomerSummary;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::state::AppState;

/// GET /customers/dashboard/summary - totals over the caller's visible customers
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
) -> ApiResult<CustomerSummary> {
    let summary = state.customers().summary(&current.actor, Utc::now()).await?;
    Ok(ApiResponse::success(summary, "Dashboard summary retrieved"))
}
