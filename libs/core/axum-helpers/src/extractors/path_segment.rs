//! Single string path parameter with an envelope rejection.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

/// The route's only path parameter, percent-decoded and trimmed.
///
/// Blank segments are rejected as `BadRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment(pub String);

impl<S> FromRequestParts<S> for PathSegment
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("invalid path parameter".to_string()))?;
        let value = raw.trim();
        if value.is_empty() {
            return Err(AppError::BadRequest("path parameter is required".to_string()));
        }
        Ok(PathSegment(value.to_string()))
    }
}
