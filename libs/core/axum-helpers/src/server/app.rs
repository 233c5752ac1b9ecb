use super::shutdown::shutdown_signal;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{REQUEST_ID_HEADER, create_cors_layer, handle_panic, request_context};
use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware,
};
use core_config::server::ServerConfig;
use std::io;
use std::net::SocketAddr;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Starts the server and blocks until SIGINT/SIGTERM.
///
/// Connect info is enabled so handlers can fall back to the socket address
/// when no proxy header names the client.
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    })?;

    info!("Server stopped");
    Ok(())
}

/// Span for one request.
///
/// Uses the matched route template rather than the raw path so tokens and
/// emails embedded in paths never reach the logs. `principal_id` is recorded
/// later by the authentication middleware.
fn make_request_span(request: &Request<Body>) -> Span {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "<unmatched>".to_string());
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %path,
        request_id = %request_id,
        principal_id = tracing::field::Empty,
    )
}

/// Wraps `apis` with the cross-cutting HTTP stack.
///
/// Outermost first:
/// 1. CORS, when origins are configured
/// 2. `X-Request-Id`: reuse the inbound value or generate a UUID, echo it back
/// 3. request span with method, route, status and latency
/// 4. request context: correlation id task-local and request deadline
/// 5. panic recovery into the `Internal` envelope
///
/// Swagger UI is served at `/swagger-ui`, the document at `/api-docs/openapi.json`.
/// Unknown routes and methods get the standard envelope.
pub fn create_router<T>(apis: Router, server_config: &ServerConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            server_config.request_timeout,
            request_context,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if server_config.cors_allowed_origins.is_empty() {
        return Ok(router);
    }

    info!(
        "CORS configured with allowed origins: {}",
        server_config.cors_allowed_origins.join(",")
    );
    Ok(router.layer(create_cors_layer(&server_config.cors_allowed_origins)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi()]
    struct EmptyDoc;

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    fn app() -> Router {
        let apis = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route("/boom", get(boom));
        create_router::<EmptyDoc>(apis, &ServerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(REQUEST_ID_HEADER, "client-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-supplied");
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_absent() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_route_gets_envelope_and_request_id() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "NotFound");
    }

    #[tokio::test]
    async fn test_wrong_method_gets_405_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_panic_reports_correlation_id_matching_header() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/boom")
                    .header(REQUEST_ID_HEADER, "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["message"], "internal error");
        assert_eq!(json["error"]["correlation_id"], "trace-me");
    }
}
