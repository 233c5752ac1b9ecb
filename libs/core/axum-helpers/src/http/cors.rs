use axum::http::{HeaderName, HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS layer for the configured origins.
///
/// Allows the methods the account routes use plus the `Authorization` and
/// `X-Request-Id` headers, and exposes `X-Request-Id` to browsers.
pub fn create_cors_layer(origins: &[String]) -> io::Result<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<_, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {e}"),
            )
        })?;

    let request_id = HeaderName::from_static(super::context::REQUEST_ID_HEADER);

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            request_id.clone(),
        ])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(3600)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_origin() {
        let err = create_cors_layer(&["bad\norigin".to_string()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_accepts_origin_list() {
        assert!(create_cors_layer(&["http://localhost:3000".to_string()]).is_ok());
    }
}
