// handlers/public/auth/login.rs - POST /api/v1/auth/login handler

use axum::extract::State;

use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{LoginRequest, LoginResponse};
use crate::state::AppState;

/// Exchanges email and password for a session token.
///
/// Wrong email and wrong password are indistinguishable to the caller (401).
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let login = state.auth.login(req).await?;
    tracing::info!(user_id = %login.user.id, "User logged in");
    Ok(ApiResponse::success(login).with_message("Login successful"))
}
