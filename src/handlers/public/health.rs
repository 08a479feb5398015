use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /health - 200 while the backend answers, 503 otherwise
pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    match state.health.ping().await {
        Ok(()) => ApiResponse::success(HealthStatus {
            status: "up",
            timestamp: Utc::now(),
        })
        .with_message("API is healthy")
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            ApiError::service_unavailable("backend connection failed").into_response()
        }
    }
}
