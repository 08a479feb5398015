// handlers/public/auth/register.rs - POST /api/v1/auth/register handler

use axum::extract::State;

use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::models::{CreateUserRequest, User};
use crate::state::AppState;

/// Creates the auth identity and the profile record. Returns 201 with the new user.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    let user = state.auth.register(req).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}
