//! Per-request correlation id and deadline.
//!
//! [`request_context`] runs once per request. It reads the `X-Request-Id` header
//! (already filled in by `SetRequestIdLayer`), starts the deadline clock and
//! makes the resulting [`RequestContext`] available two ways:
//!
//! - as a request extension, for handlers (`RequestContext` is an extractor);
//! - as a task-local, for code that has no request at hand, such as error
//!   rendering and the panic handler.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Deadline used when a context has to be synthesized outside the middleware.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

tokio::task_local! {
    static CURRENT: RequestContext;
}

#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: String,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, budget: Duration) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: Instant::now() + budget,
        }
    }

    /// Context with a freshly generated id.
    pub fn generate(budget: Duration) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), budget)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Context of the request currently being served on this task, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }

    /// Run `fut` with `self` installed as the task-local context.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, fut).await
    }

    /// Run `fut` under the remaining budget.
    ///
    /// Dropping the inner future on expiry cancels whatever it was awaiting.
    pub async fn within_deadline<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| AppError::UpstreamTimeout)
    }
}

/// Correlation id of the request being served on this task.
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(|ctx| ctx.request_id.clone()).ok()
}

fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        if let Some(ctx) = RequestContext::current() {
            return Ok(ctx);
        }
        Ok(match request_id_from_headers(&parts.headers) {
            Some(id) => RequestContext::new(id, DEFAULT_REQUEST_TIMEOUT),
            None => RequestContext::generate(DEFAULT_REQUEST_TIMEOUT),
        })
    }
}

/// Middleware installing the [`RequestContext`] and enforcing the request deadline.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(axum::middleware::from_fn_with_state(
///         Duration::from_secs(30),
///         request_context,
///     ));
/// ```
pub async fn request_context(
    State(budget): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = match request_id_from_headers(request.headers()) {
        Some(id) => RequestContext::new(id, budget),
        None => RequestContext::generate(budget),
    };
    request.extensions_mut().insert(ctx.clone());

    let deadline = ctx.clone();
    ctx.scope(async move {
        match deadline.within_deadline(next.run(request)).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn echo_id(ctx: RequestContext) -> String {
        ctx.request_id().to_string()
    }

    fn app(budget: Duration) -> Router {
        Router::new()
            .route("/id", get(echo_id))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "late"
                }),
            )
            .layer(middleware::from_fn_with_state(budget, request_context))
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_used() {
        let response = app(DEFAULT_REQUEST_TIMEOUT)
            .oneshot(
                Request::builder()
                    .uri("/id")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"abc-123");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_produces_upstream_timeout() {
        let response = app(Duration::from_millis(50))
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_task_local_visible_inside_scope_only() {
        assert!(current_request_id().is_none());
        let ctx = RequestContext::new("scoped", Duration::from_secs(1));
        let seen = ctx.scope(async { current_request_id() }).await;
        assert_eq!(seen.as_deref(), Some("scoped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_saturates_at_zero() {
        let ctx = RequestContext::new("r", Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(ctx.remaining(), Duration::ZERO);
        assert!(matches!(
            ctx.within_deadline(std::future::pending::<()>()).await,
            Err(AppError::UpstreamTimeout)
        ));
    }
}
