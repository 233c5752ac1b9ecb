use crate::errors::{ErrorKind, error_response};
use axum::response::Response;
use std::any::Any;

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer`.
///
/// The payload is logged; the client only sees the `Internal` envelope with the
/// request's correlation id.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Handler panicked");
    error_response(ErrorKind::Internal, crate::errors::INTERNAL_MESSAGE)
}
