use axum::response::Response;

use super::{ErrorKind, error_response};

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    error_response(ErrorKind::NotFound, "the requested resource was not found")
}

/// Fallback for known routes hit with the wrong method.
pub async fn method_not_allowed() -> Response {
    error_response(
        ErrorKind::MethodNotAllowed,
        "the HTTP method is not allowed for this resource",
    )
}
