//! # Axum Helpers
//!
//! Shared HTTP plumbing for the gateway binaries.
//!
//! - **[`errors`]**: error kinds, the JSON error envelope and [`AppError`]
//! - **[`http`]**: request context (correlation id, deadline), client metadata,
//!   CORS and panic recovery
//! - **[`extractors`]**: body and path extractors with envelope rejections
//! - **[`auth`]**: bearer token parsing
//! - **[`server`]**: router assembly, health endpoint, graceful shutdown

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{BearerToken, extract_bearer_token};
pub use errors::{AppError, ErrorKind, ErrorResponse, FieldError, FieldErrors, error_response};
pub use extractors::{JsonBody, PathSegment, PositiveId};
pub use http::{ClientInfo, RequestContext};
pub use server::{create_app, create_router, health_router, shutdown_signal};
