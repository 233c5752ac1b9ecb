//! JSON body extractor with the standard "invalid payload" rejection.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// Like `axum::Json`, but rejections render as a `BadRequest` envelope.
///
/// Field validation is left to the caller so every failing field can be
/// reported together.
///
/// ```ignore
/// async fn create(JsonBody(payload): JsonBody<CreateAccount>) -> Result<Json<Account>, AppError> {
///     registry.validate(&payload).await?;
///     ...
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}
