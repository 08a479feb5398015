// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::ServiceError;

/// HTTP API error with a status code and client-safe detail
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Upstream(String),
    Internal(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) | ApiError::Internal(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Detail shown to the client in the `error` field
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// One-line summary shown in the `message` field
    pub fn summary(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation failed",
            ApiError::InvalidJson(_) => "Invalid request body",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not found",
            ApiError::Upstream(_) => "Upstream service error",
            ApiError::Internal(_) => "Internal server error",
            ApiError::ServiceUnavailable(_) => "Service unavailable",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "message": self.summary(),
            "error": self.message(),
        })
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::validation(msg),
            ServiceError::InvalidCredentials => ApiError::unauthorized("invalid email or password"),
            ServiceError::UserNotFound(_) => ApiError::not_found("user not found"),
            ServiceError::ProductNotFound(_) => ApiError::not_found("product not found"),
            ServiceError::Token(e) => {
                // Verification failures never reach here; only signing does
                tracing::error!(error = %e, "Token signing failed");
                ApiError::internal("failed to issue session token")
            }
            ServiceError::Gateway { context, source } => {
                tracing::error!(context, error = %source, "Backend call failed");
                ApiError::upstream(context)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.summary(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    #[test]
    fn test_service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("email is required".into()), 400),
            (ServiceError::InvalidCredentials, 401),
            (ServiceError::UserNotFound("u1".into()), 404),
            (ServiceError::ProductNotFound("p1".into()), 404),
            (ServiceError::Token(crate::auth::TokenError::Signing("bad key".into())), 500),
            (
                ServiceError::gateway("failed to list products")(GatewayError::Decode("eof".into())),
                500,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_upstream_detail_hides_cause() {
        let err = ApiError::from(ServiceError::gateway("failed to get product")(GatewayError::Rejected {
            status: 500,
            message: "relation \"products\" does not exist".into(),
        }));

        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "failed to get product");
        assert!(!body.to_string().contains("relation"));
    }

    #[test]
    fn test_envelope_shape() {
        let body = ApiError::validation("price must be greater than zero").to_json();
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["error"], "price must be greater than zero");
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3, "unexpected envelope keys: {:?}", keys);
    }
}
