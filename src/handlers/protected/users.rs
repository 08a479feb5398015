use axum::extract::State;

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::models::{UpdateUserRequest, User};
use crate::state::AppState;

/// GET /api/v1/users/me
pub async fn me_get(State(state): State<AppState>, caller: AuthUser) -> ApiResult<User> {
    let user = state.auth.profile(&caller.user_id).await?;
    Ok(ApiResponse::success(user).with_message("User profile retrieved successfully"))
}

/// PUT /api/v1/users/me - only names are writable
pub async fn me_put(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = state.auth.update_profile(&caller.user_id, req).await?;
    Ok(ApiResponse::success(user).with_message("User profile updated successfully"))
}
