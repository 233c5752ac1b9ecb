pub mod codes;
pub mod fields;
pub mod handlers;

pub use codes::ErrorKind;
pub use fields::{FieldError, FieldErrors};

use crate::http::context::current_request_id;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message returned for every `Internal` failure, whatever the cause.
pub const INTERNAL_MESSAGE: &str = "internal error";
/// Message returned when the request deadline expires.
pub const UPSTREAM_TIMEOUT_MESSAGE: &str = "upstream timeout";
/// Message returned for undecodable request bodies.
pub const INVALID_PAYLOAD_MESSAGE: &str = "invalid payload";

/// Standard error envelope.
///
/// ```json
/// {
///   "error": {
///     "code": "UnprocessableEntity",
///     "message": "validation failed",
///     "fields": [{ "name": "password", "message": "must be at least 8 characters" }]
///   }
/// }
/// ```
///
/// `correlation_id` is only present on `Internal` errors; every response also
/// carries it in the `X-Request-Id` header.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable kind tag
    pub code: ErrorKind,
    /// Human-readable message, safe to show to end users
    pub message: String,
    /// Per-field validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Application error type that renders as the standard envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("invalid payload: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The string is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("upstream timeout")]
    UpstreamTimeout,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::JsonRejection(_) | AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Validation(_) => ErrorKind::UnprocessableEntity,
            AppError::Internal(_) | AppError::UpstreamTimeout => ErrorKind::Internal,
        }
    }

    /// Build from a kind and message, e.g. when translating a peer error.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::BadRequest | ErrorKind::MethodNotAllowed => AppError::BadRequest(message),
            ErrorKind::Unauthorized => AppError::Unauthorized(message),
            ErrorKind::Forbidden => AppError::Forbidden(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::UnprocessableEntity => {
                let mut fields = FieldErrors::new();
                fields.push("body", message);
                AppError::Validation(fields)
            }
            ErrorKind::Internal => AppError::Internal(message),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        AppError::Validation(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (message, fields) = match self {
            AppError::JsonRejection(e) => {
                tracing::info!(error_kind = %kind, "Rejected request body: {}", e.body_text());
                (INVALID_PAYLOAD_MESSAGE.to_string(), None)
            }
            AppError::Validation(fields) => {
                tracing::info!(
                    error_kind = %kind,
                    fields = ?fields.field_names(),
                    "Request validation failed"
                );
                (kind.default_message().to_string(), Some(fields.into_inner()))
            }
            AppError::Internal(detail) => {
                tracing::error!(error_kind = %kind, "Internal error: {}", detail);
                (INTERNAL_MESSAGE.to_string(), None)
            }
            AppError::UpstreamTimeout => {
                tracing::warn!(error_kind = %kind, "Request deadline exceeded");
                (UPSTREAM_TIMEOUT_MESSAGE.to_string(), None)
            }
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => {
                tracing::info!(error_kind = %kind, "{}", msg);
                (msg, None)
            }
        };

        envelope(kind, message, fields)
    }
}

/// Renders an envelope for `kind` with the given message.
///
/// Used by fallbacks and middleware that have no [`AppError`] at hand.
pub fn error_response(kind: ErrorKind, message: impl Into<String>) -> Response {
    envelope(kind, message.into(), None)
}

fn envelope(kind: ErrorKind, message: String, fields: Option<Vec<FieldError>>) -> Response {
    let correlation_id = if kind.is_server_error() {
        current_request_id()
    } else {
        None
    };

    let body = ErrorResponse {
        error: ErrorBody {
            code: kind,
            message,
            fields,
            correlation_id,
        },
    };

    (kind.status(), Json(body)).into_response()
}
