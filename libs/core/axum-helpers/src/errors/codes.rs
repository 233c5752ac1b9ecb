//! Error kinds exposed to HTTP clients.
//!
//! Every failure leaving the gateway is classified into one of these kinds. The
//! kind decides the HTTP status and is serialized verbatim as the envelope's
//! `code` tag, so the names are part of the public contract.
//!
//! ```rust
//! use axum_helpers::errors::ErrorKind;
//! use axum::http::StatusCode;
//!
//! let kind = ErrorKind::Conflict;
//! assert_eq!(kind.as_str(), "Conflict");
//! assert_eq!(kind.status(), StatusCode::CONFLICT);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    /// Undecodable body, malformed parameter or value outside an enumeration
    BadRequest,
    /// Missing or invalid credentials or token
    Unauthorized,
    /// Principal is known but not permitted
    Forbidden,
    /// Target entity is absent
    NotFound,
    /// Route exists but not for this HTTP method
    MethodNotAllowed,
    /// Duplicate resource or disallowed state transition
    Conflict,
    /// Field-level validation failed
    UnprocessableEntity,
    /// Peer unavailable, timeout or unexpected failure
    Internal,
}

impl ErrorKind {
    /// Tag written into the envelope's `code` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnprocessableEntity => "UnprocessableEntity",
            ErrorKind::Internal => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when the caller has nothing more specific to say.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::MethodNotAllowed => "method not allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::UnprocessableEntity => "validation failed",
            ErrorKind::Internal => "internal error",
        }
    }

    /// Server-side kinds are logged at `error`, the rest at `info`.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
