use axum::{extract::State, Extension};

use crate::database::models::Actor;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::state::AppState;

/// POST /logout - revoke the token used for this request
pub async fn logout(State(state): State<AppState>, Extension(current): Extension<CurrentActor>) -> ApiResult<()> {
    state.auth().logout(&current).await?;
    Ok(ApiResponse::message("Logged out successfully"))
}

/// GET /me - the authenticated actor
pub async fn me(Extension(current): Extension<CurrentActor>) -> ApiResult<Actor> {
    Ok(ApiResponse::success(current.actor, "Authenticated user"))
}
