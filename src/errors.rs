use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::services::messaging_service::NotificationError;

/// Main error type for the order relay.
///
/// Every variant is terminal for the request it was raised in.
#[derive(Debug)]
pub enum RelayError {
    // Request shape
    MethodNotAllowed,
    UnsupportedContentType,
    InvalidJsonBody,
    PayloadTooLarge,
    MissingField(String),

    // Shared secret
    Unauthorized,

    // Process configuration (credentials)
    Configuration(String),

    // Messaging provider
    Delivery(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::MethodNotAllowed => write!(f, "Only POST"),
            RelayError::UnsupportedContentType => write!(f, "UNSUPPORTED_CONTENT_TYPE"),
            RelayError::InvalidJsonBody => write!(f, "INVALID_JSON_BODY"),
            RelayError::PayloadTooLarge => write!(f, "PAYLOAD_TOO_LARGE"),
            RelayError::MissingField(field) => write!(f, "Missing {}", field),

            RelayError::Unauthorized => write!(f, "Invalid signature"),

            RelayError::Configuration(msg) => write!(f, "{}", msg),

            RelayError::Delivery(msg) if msg.trim().is_empty() => write!(f, "send failed"),
            RelayError::Delivery(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RelayError {}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RelayError::InvalidJsonBody => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MissingField(_) => StatusCode::BAD_REQUEST,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        RelayError::MissingField(field.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        RelayError::Configuration(msg.into())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", message);
        } else {
            tracing::warn!(status = status.as_u16(), "request rejected: {}", message);
        }

        let error_response = ErrorResponse {
            ok: false,
            error: message,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type RelayResult<T> = Result<T, RelayError>;

impl From<NotificationError> for RelayError {
    fn from(err: NotificationError) -> Self {
        match err {
            // The provider's own wording goes back to the caller untouched
            NotificationError::Api { message, .. } => RelayError::Delivery(message),
            other => RelayError::Delivery(other.to_string()),
        }
    }
}
