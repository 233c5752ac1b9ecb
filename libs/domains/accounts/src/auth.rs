//! Authentication filter for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_helpers::{AppError, BearerToken, ErrorKind, RequestContext, extract_bearer_token};
use grpc_client::conversions::non_zero;
use rpc::accounts as pb;

use crate::gateway::AccountGateway;
use crate::models::Principal;

pub const INVALID_TOKEN_MESSAGE: &str = "invalid or expired token";

/// Resolves the bearer token into a [`Principal`] through the account
/// service's ValidateToken call.
///
/// Requests without a well-formed `Authorization: Bearer` header are rejected
/// before any RPC is made.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/accounts/profile", get(get_profile))
///     .route_layer(axum::middleware::from_fn_with_state(gateway.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match extract_bearer_token(request.headers()) {
        BearerToken::Present(token) => token,
        BearerToken::Missing => {
            tracing::debug!("No bearer token on protected route");
            return Err(AppError::Unauthorized(
                "missing authorization header".to_string(),
            ));
        }
        BearerToken::Malformed => {
            tracing::debug!("Malformed authorization header");
            return Err(AppError::Unauthorized(
                "malformed authorization header".to_string(),
            ));
        }
    };

    let reply = gateway
        .rpc()
        .validate_token(&ctx, pb::ValidateTokenRequest { token })
        .await
        .map_err(|e| {
            if e.is_any(&[ErrorKind::Unauthorized, ErrorKind::BadRequest, ErrorKind::NotFound]) {
                AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
            } else {
                AppError::from(e)
            }
        })?;

    if !reply.valid || reply.user_id < 1 {
        tracing::debug!("Token rejected by account service");
        return Err(AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
    }

    let principal = Principal {
        id: reply.user_id,
        role: reply.role.parse().ok(),
        branch_id: non_zero(reply.branch_id),
    };
    tracing::Span::current().record("principal_id", principal.id);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::models::Role;
    use crate::rpc::MockAccountRpc;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn whoami(principal: Principal) -> String {
        format!("{}:{:?}", principal.id, principal.role)
    }

    fn app(mock: MockAccountRpc) -> Router {
        let gateway = AccountGateway::new(Arc::new(mock));
        Router::new()
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(gateway.clone(), require_auth))
            .with_state(gateway)
    }

    async fn call(app: Router, auth: Option<&'static str>) -> axum::response::Response {
        let mut builder = Request::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_issues_no_rpc() {
        for auth in [None, Some("Basic dXNlcg=="), Some("Bearer ")] {
            let mut mock = MockAccountRpc::new();
            mock.expect_validate_token().never();
            let response = call(app(mock), auth).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
        }
    }

    #[tokio::test]
    async fn test_valid_token_places_principal() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token()
            .withf(|_, req| req.token == "good")
            .times(1)
            .returning(|_, _| {
                Ok(pb::ValidateTokenResponse {
                    valid: true,
                    user_id: 42,
                    role: "manager".into(),
                    ..Default::default()
                })
            });

        let response = call(app(mock), Some("Bearer good")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], format!("42:{:?}", Some(Role::Manager)).as_bytes());
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthorized() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token().returning(|_, _| {
            Ok(pb::ValidateTokenResponse {
                valid: false,
                ..Default::default()
            })
        });
        assert_eq!(
            call(app(mock), Some("Bearer stale")).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Unauthorized, "expired")));
        assert_eq!(
            call(app(mock), Some("Bearer stale")).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_peer_failure_is_internal() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Internal, "connection refused")));
        assert_eq!(
            call(app(mock), Some("Bearer whatever")).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
