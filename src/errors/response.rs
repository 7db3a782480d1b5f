use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::codes::ErrorCode;
use super::report::Error;

/// Structured error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false for errors
    pub success: bool,
    /// Error details
    pub error: ErrorDetail,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Symbolic error code for programmatic handling
    pub code: ErrorCode,
    /// Stable numeric identifier of the code
    pub error_code: u16,
    /// Short human-readable title
    pub title: String,
    /// Rendered detail message
    pub message: String,
    /// Request ID for tracing
    pub request_id: String,
}

impl ErrorResponse {
    /// Create an error response from a reported failure
    pub fn from_error(error: &Error) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: error.code(),
                error_code: error.code().numeric_code(),
                title: error.code().title().to_string(),
                message: error.detail_message(),
                request_id: Uuid::new_v4().to_string(),
            },
        }
    }

    /// Create an error response with a pre-rendered message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code,
                error_code: code.numeric_code(),
                title: code.title().to_string(),
                message: message.into(),
                request_id: Uuid::new_v4().to_string(),
            },
        }
    }
}

impl From<Error> for ErrorResponse {
    fn from(error: Error) -> Self {
        Self::from_error(&error)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.code.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        ErrorResponse::from_error(&self).into_response()
    }
}

/// Helper for creating common errors
impl ErrorResponse {
    pub fn entity_not_found(resource: &str, id: impl Into<serde_json::Value>) -> Self {
        Error::new(ErrorCode::EntityNotFound)
            .with_arg(resource)
            .with_arg(id.into())
            .into()
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}
