//! Integer path parameter extractor.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

/// A single `i64` path parameter that must be `>= 1`.
///
/// Anything else, including non-numeric text, is rejected as `BadRequest`
/// before the handler runs.
///
/// ```ignore
/// async fn find(PositiveId(id): PositiveId) -> ... { ... }
/// let app = Router::new().route("/accounts/{id}", get(find));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveId(pub i64);

impl PositiveId {
    pub fn parse(name: &str, raw: &str) -> Result<Self, AppError> {
        match raw.trim().parse::<i64>() {
            Ok(id) if id >= 1 => Ok(PositiveId(id)),
            _ => Err(AppError::BadRequest(format!(
                "{name} must be a positive integer"
            ))),
        }
    }
}

impl<S> FromRequestParts<S> for PositiveId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("missing path parameter".to_string()))?;
        PositiveId::parse("id", &raw)
    }
}
