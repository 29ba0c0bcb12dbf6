use axum::{
    extract::{Query, State},
    Extension,
};

use crate::database::models::CustomerPage;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::state::AppState;

/// GET /customers - search, filter, sort and paginate visible customers
///
/// An empty page is still a 200 with `data.data = []`.
pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    Query(params): Query<ListParams>,
) -> ApiResult<CustomerPage> {
    let page = state.customers().list(&current.actor, &params).await?;
    Ok(ApiResponse::success(page, "Customers retrieved successfully"))
}
