use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<&'static str>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: StatusCode::OK,
        }
    }

    /// 201 Created carrying `data`
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: StatusCode::CREATED,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl ApiResponse<()> {
    /// 200 OK with a message and no `data` field
    pub fn message_only(message: &'static str) -> Self {
        Self {
            data: None,
            message: Some(message),
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));

        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::from(message));
        }

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => {
                    envelope.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize response data");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Internal server error",
                            "error": "failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
