//! Request Binder: JSON body decoding followed by registry validation.

use axum::extract::{FromRef, FromRequest, FromRequestParts, Request};
use axum_helpers::{AppError, JsonBody, RequestContext};
use serde::de::DeserializeOwned;

use crate::gateway::AccountGateway;
use crate::validation::Validated;

/// A decoded body that passed every check in the [`ValidatorRegistry`].
///
/// Undecodable bodies are rejected with `BadRequest` ("invalid payload"),
/// failing fields with `UnprocessableEntity` listing all of them and a value
/// already taken upstream with `Conflict`.
///
/// [`ValidatorRegistry`]: crate::validation::ValidatorRegistry
pub struct ValidatedBody<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedBody<T>
where
    T: DeserializeOwned + Validated + 'static,
    S: Send + Sync,
    AccountGateway: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Ok(ctx) = RequestContext::from_request_parts(&mut parts, state).await;
        let req = Request::from_parts(parts, body);

        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        let gateway = AccountGateway::from_ref(state);
        gateway.validators().validate_request(&ctx, &value).await?;
        Ok(ValidatedBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAccountRpc;
    use crate::models::RegisterRequest;
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn handler(ValidatedBody(body): ValidatedBody<RegisterRequest>) -> String {
        body.email
    }

    fn app(rpc: InMemoryAccountRpc) -> Router {
        Router::new()
            .route("/", post(handler))
            .with_state(AccountGateway::new(Arc::new(rpc)))
    }

    async fn send(app: Router, body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, json) = send(app(InMemoryAccountRpc::new()), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "invalid payload");
    }

    #[tokio::test]
    async fn test_field_failures_are_unprocessable() {
        let rpc = InMemoryAccountRpc::new();
        let (status, json) = send(app(rpc.clone()), r#"{"email":"a@b.co","password":"pw1"}"#).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = json["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"password"));
        assert_eq!(rpc.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_body_reaches_handler() {
        let rpc = InMemoryAccountRpc::new();
        let app = app(rpc.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Ada","email":"ada@example.com","password":"secret12"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(rpc.calls(), vec!["FindByEmail"]);
    }
}
