use axum::extract::State;

use crate::api::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AuthSession, LoginRequest, RegisterRequest};
use crate::state::AppState;

/// POST /register - create a `user` actor and return `{token, user}` (201)
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<AuthSession> {
    let session = state.auth().register(body).await?;
    Ok(ApiResponse::created(session, "User registered successfully"))
}

/// POST /login - exchange email and password for `{token, user}`
///
/// Unknown email and wrong password both answer 422 with
/// `errors.email = ["Invalid credentials"]`.
pub async fn login(State(state): State<AppState>, ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<AuthSession> {
    let session = state.auth().login(body).await?;
    Ok(ApiResponse::success(session, "Login successful"))
}
