//! Public session endpoints under `/accounts/auth`.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_helpers::{
    AppError, BearerToken, ClientInfo, ErrorKind, ErrorResponse, RequestContext,
    extract_bearer_token,
    errors::INVALID_PAYLOAD_MESSAGE,
};
use grpc_client::conversions::{non_empty, timestamp_to_datetime};
use rpc::accounts as pb;

use super::{EMAIL_ALREADY_REGISTERED, mask_email, require_account};
use crate::binder::ValidatedBody;
use crate::gateway::AccountGateway;
use crate::models::{
    LoginRequest, LoginResponse, LogoutRequest, MessageResponse, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest, RegisterResponse, ValidateTokenResponse,
};

pub const INVALID_CREDENTIALS: &str = "invalid credentials";
pub const INVALID_REFRESH_TOKEN: &str = "invalid or expired refresh token";
pub const LOGOUT_MESSAGE: &str = "logout successful";

/// Register a new account
#[utoipa::path(
    post,
    path = "/accounts/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    ValidatedBody(input): ValidatedBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(email = %mask_email(&input.email), "Registering account");

    let reply = gateway
        .rpc()
        .register(
            &ctx,
            pb::RegisterRequest {
                name: input.name,
                email: input.email,
                password: input.password,
                branch_id: input.branch_id.unwrap_or_default(),
                avatar: input.avatar.unwrap_or_default(),
                title: input.title.unwrap_or_default(),
            },
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Conflict => e.into_app_error_with(EMAIL_ALREADY_REGISTERED),
            _ => e.into(),
        })?;

    let user = require_account(reply.account, "Register")?;
    tracing::info!(account_id = user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            access_token: reply.access_token.and_then(non_empty),
            refresh_token: reply.refresh_token.and_then(non_empty),
        }),
    ))
}

/// Exchange credentials for a session
#[utoipa::path(
    post,
    path = "/accounts/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account not active", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn login(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    client: ClientInfo,
    ValidatedBody(input): ValidatedBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    tracing::info!(
        email = %mask_email(&input.email),
        client_ip = client.ip.as_deref().unwrap_or("-"),
        user_agent = client.user_agent.as_deref().unwrap_or("-"),
        "Login attempt"
    );

    let reply = gateway
        .rpc()
        .login(
            &ctx,
            pb::LoginRequest {
                email: input.email,
                password: input.password,
                client_ip: client.ip.unwrap_or_default(),
                user_agent: client.user_agent.unwrap_or_default(),
            },
        )
        .await
        .map_err(|e| match e.kind() {
            // Unknown accounts look exactly like a wrong password.
            ErrorKind::Unauthorized | ErrorKind::NotFound => {
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            }
            _ => e.into(),
        })?;

    let user = require_account(reply.account, "Login")?;
    tracing::info!(account_id = user.id, "Login succeeded");

    Ok(Json(LoginResponse {
        access_token: reply.access_token,
        refresh_token: reply.refresh_token,
        expires_at: timestamp_to_datetime(reply.expires_at),
        user,
    }))
}

/// End a session
///
/// The token comes from the body or, failing that, the bearer header. The
/// response never reveals whether the session existed.
#[utoipa::path(
    post,
    path = "/accounts/auth/logout",
    tag = "auth",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 400, description = "No token supplied", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    client: ClientInfo,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let input: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::BadRequest(INVALID_PAYLOAD_MESSAGE.to_string()))?
    };

    let token = match input.token.and_then(non_empty) {
        Some(token) => token,
        None => match extract_bearer_token(&headers) {
            BearerToken::Present(token) => token,
            _ => return Err(AppError::BadRequest("token is required".to_string())),
        },
    };

    tracing::info!(
        client_ip = client.ip.as_deref().unwrap_or("-"),
        user_agent = client.user_agent.as_deref().unwrap_or("-"),
        "Logout"
    );

    let outcome = gateway
        .rpc()
        .logout(
            &ctx,
            pb::LogoutRequest {
                token,
                client_ip: client.ip.unwrap_or_default(),
                user_agent: client.user_agent.unwrap_or_default(),
            },
        )
        .await;
    if let Err(e) = outcome {
        tracing::warn!(error_kind = %e.kind(), "Logout not confirmed by account service");
    }

    Ok(Json(MessageResponse::new(LOGOUT_MESSAGE)))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/accounts/auth/refresh-token",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshTokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    client: ClientInfo,
    ValidatedBody(input): ValidatedBody<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    tracing::info!(
        client_ip = client.ip.as_deref().unwrap_or("-"),
        user_agent = client.user_agent.as_deref().unwrap_or("-"),
        "Refreshing session"
    );

    let reply = gateway
        .rpc()
        .refresh_token(
            &ctx,
            pb::RefreshTokenRequest {
                refresh_token: input.refresh_token,
                client_ip: client.ip.unwrap_or_default(),
                user_agent: client.user_agent.unwrap_or_default(),
            },
        )
        .await
        .map_err(|e| {
            if e.is_any(&[ErrorKind::Unauthorized, ErrorKind::BadRequest, ErrorKind::NotFound]) {
                AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Json(RefreshTokenResponse::from(reply)))
}

/// Check the bearer token
///
/// A rejected token is an answer, not an error: the reply is 200 with
/// `valid: false`.
#[utoipa::path(
    post,
    path = "/accounts/auth/validate-token",
    tag = "auth",
    responses(
        (status = 200, description = "Validation result", body = ValidateTokenResponse),
        (status = 400, description = "Missing or malformed Authorization header", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn validate_token(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    headers: HeaderMap,
) -> Result<Json<ValidateTokenResponse>, AppError> {
    let token = match extract_bearer_token(&headers) {
        BearerToken::Present(token) => token,
        BearerToken::Missing => {
            return Err(AppError::BadRequest(
                "missing authorization header".to_string(),
            ));
        }
        BearerToken::Malformed => {
            return Err(AppError::BadRequest(
                "malformed authorization header".to_string(),
            ));
        }
    };

    match gateway
        .rpc()
        .validate_token(&ctx, pb::ValidateTokenRequest { token })
        .await
    {
        Ok(reply) => Ok(Json(ValidateTokenResponse::from(reply))),
        Err(e) if e.is_any(&[ErrorKind::Unauthorized, ErrorKind::BadRequest, ErrorKind::NotFound]) => {
            Ok(Json(ValidateTokenResponse::invalid(
                crate::auth::INVALID_TOKEN_MESSAGE,
            )))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{TOKEN, account, app, call};
    use crate::error::RpcError;
    use crate::rpc::MockAccountRpc;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use axum_helpers::ErrorKind;
    use rpc::accounts as pb;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_short_password_registers_nothing() {
        let mut mock = MockAccountRpc::new();
        mock.expect_find_by_email().never();
        mock.expect_register().never();

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/register",
            None,
            Some(json!({ "email": "a@b.co", "password": "pw1" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = json["error"]["fields"].as_array().unwrap();
        assert!(fields.iter().any(|f| f["name"] == "password"));
    }

    #[tokio::test]
    async fn test_register_conflict_from_peer() {
        let mut mock = MockAccountRpc::new();
        mock.expect_find_by_email()
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "no such account")));
        mock.expect_register()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Conflict, "unique violation")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["message"], "email already registered");
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let mut mock = MockAccountRpc::new();
        mock.expect_login()
            .withf(|_, req| req.email == "u@x.com" && req.password == "secret12")
            .times(1)
            .returning(|_, _| Err(RpcError::new(ErrorKind::Unauthorized, "password mismatch")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/login",
            None,
            Some(json!({ "email": "u@x.com", "password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            json,
            json!({ "error": { "code": "Unauthorized", "message": "invalid credentials" } })
        );
    }

    #[tokio::test]
    async fn test_login_unknown_email_looks_like_wrong_password() {
        let mut mock = MockAccountRpc::new();
        mock.expect_login()
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "no account for u@x.com")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/login",
            None,
            Some(json!({ "email": "u@x.com", "password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_login_inactive_account_keeps_reason() {
        let mut mock = MockAccountRpc::new();
        mock.expect_login()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Forbidden, "account is suspended")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/login",
            None,
            Some(json!({ "email": "u@x.com", "password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["message"], "account is suspended");
    }

    #[tokio::test]
    async fn test_login_forwards_client_metadata() {
        let mut mock = MockAccountRpc::new();
        mock.expect_login()
            .withf(|_, req| req.client_ip == "203.0.113.7" && req.user_agent == "curl/8.0")
            .times(1)
            .returning(|_, _| {
                Ok(pb::LoginResponse {
                    access_token: "a".into(),
                    refresh_token: "r".into(),
                    expires_at: 1_900_000_000,
                    account: Some(account(3, "u@x.com")),
                })
            });

        let response = app(mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/accounts/auth/login")
                    .header("content-type", "application/json")
                    .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                    .header("user-agent", "curl/8.0")
                    .body(Body::from(r#"{"email":"u@x.com","password":"secret12"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_hides_peer_outcome() {
        let mut mock = MockAccountRpc::new();
        mock.expect_logout()
            .withf(|_, req| req.token == "stale")
            .times(1)
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "session not found")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/logout",
            None,
            Some(json!({ "token": "stale" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "message": "logout successful" }));
    }

    #[tokio::test]
    async fn test_logout_falls_back_to_bearer_header() {
        let mut mock = MockAccountRpc::new();
        mock.expect_logout()
            .withf(|_, req| req.token == TOKEN)
            .times(1)
            .returning(|_, _| Ok(pb::MessageResponse::default()));

        let (status, _) = call(app(mock), "POST", "/accounts/auth/logout", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_without_token_is_bad_request() {
        let mut mock = MockAccountRpc::new();
        mock.expect_logout().never();

        let (status, _) = call(app(mock), "POST", "/accounts/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_unauthorized() {
        let mut mock = MockAccountRpc::new();
        mock.expect_refresh_token()
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "unknown token")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/auth/refresh-token",
            None,
            Some(json!({ "refresh_token": "old" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "invalid or expired refresh token");
    }

    #[tokio::test]
    async fn test_validate_token_requires_header() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token().never();

        let (status, _) = call(app(mock), "POST", "/accounts/auth/validate-token", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validate_token_rejection_is_not_an_error() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Unauthorized, "signature mismatch")));

        let (status, json) =
            call(app(mock), "POST", "/accounts/auth/validate-token", Some(TOKEN), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], false);
        assert_eq!(json["message"], "invalid or expired token");
    }

    #[tokio::test]
    async fn test_validate_token_peer_failure_is_internal() {
        let mut mock = MockAccountRpc::new();
        mock.expect_validate_token()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Internal, "connection refused")));

        let (status, json) =
            call(app(mock), "POST", "/accounts/auth/validate-token", Some(TOKEN), None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "internal error");
    }
}
