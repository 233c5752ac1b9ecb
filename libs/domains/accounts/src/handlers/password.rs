//! Password lifecycle and email verification.
//!
//! Forgot-password and resend-verification answer identically whether or not
//! the address is known; the peer's outcome only reaches the logs.

use axum::{Json, extract::State};
use axum_helpers::{AppError, ErrorKind, ErrorResponse, PathSegment, RequestContext};
use rpc::accounts as pb;

use super::mask_email;
use crate::binder::ValidatedBody;
use crate::gateway::AccountGateway;
use crate::models::{
    ChangePasswordRequest, EmailRequest, MessageResponse, Principal, ResetPasswordRequest,
};

pub const FORGOT_PASSWORD_MESSAGE: &str = "if the address exists, a reset link has been sent";
pub const RESEND_VERIFICATION_MESSAGE: &str =
    "if the address exists and is unverified, a verification email has been sent";
pub const INVALID_RESET_TOKEN: &str = "invalid or expired reset token";
pub const INVALID_VERIFICATION_TOKEN: &str = "invalid or expired verification token";
pub const WRONG_CURRENT_PASSWORD: &str = "current password is incorrect";

const TOKEN_REJECTIONS: [ErrorKind; 3] = [
    ErrorKind::BadRequest,
    ErrorKind::Unauthorized,
    ErrorKind::NotFound,
];

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/accounts/password/forgot",
    tag = "password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn forgot_password(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    ValidatedBody(input): ValidatedBody<EmailRequest>,
) -> Json<MessageResponse> {
    let masked = mask_email(&input.email);
    match gateway
        .rpc()
        .forgot_password(&ctx, pb::ForgotPasswordRequest { email: input.email })
        .await
    {
        Ok(_) => tracing::info!(email = %masked, "Password reset requested"),
        Err(e) => tracing::warn!(email = %masked, error_kind = %e.kind(), "Password reset not issued: {}", e),
    }

    Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/accounts/password/reset",
    tag = "password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    ValidatedBody(input): ValidatedBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let reply = gateway
        .rpc()
        .reset_password(
            &ctx,
            pb::ResetPasswordRequest {
                token: input.token,
                new_password: input.new_password,
            },
        )
        .await
        .map_err(|e| {
            if e.is_any(&TOKEN_REJECTIONS) {
                AppError::BadRequest(INVALID_RESET_TOKEN.to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Json(message_or(reply, "password has been reset")))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/accounts/password/change",
    tag = "password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Unauthenticated or wrong current password", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn change_password(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    ValidatedBody(input): ValidatedBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let reply = gateway
        .rpc()
        .change_password(
            &ctx,
            pb::ChangePasswordRequest {
                user_id: principal.id,
                current_password: input.current_password,
                new_password: input.new_password,
            },
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Unauthorized => AppError::Unauthorized(WRONG_CURRENT_PASSWORD.to_string()),
            _ => e.into(),
        })?;

    tracing::info!(account_id = principal.id, "Password changed");
    Ok(Json(message_or(reply, "password changed")))
}

/// Confirm an email address
#[utoipa::path(
    get,
    path = "/accounts/email/verify/{token}",
    tag = "email",
    params(("token" = String, Path, description = "Verification token")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired verification token", body = ErrorResponse)
    )
)]
pub async fn verify_email(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    PathSegment(token): PathSegment,
) -> Result<Json<MessageResponse>, AppError> {
    let reply = gateway
        .rpc()
        .verify_email(&ctx, pb::VerifyEmailRequest { token })
        .await
        .map_err(|e| {
            if e.is_any(&TOKEN_REJECTIONS) {
                AppError::BadRequest(INVALID_VERIFICATION_TOKEN.to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Json(message_or(reply, "email verified")))
}

/// Send the verification email again
#[utoipa::path(
    post,
    path = "/accounts/email/resend-verification",
    tag = "email",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn resend_verification(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    ValidatedBody(input): ValidatedBody<EmailRequest>,
) -> Json<MessageResponse> {
    let masked = mask_email(&input.email);
    match gateway
        .rpc()
        .resend_verification(&ctx, pb::ResendVerificationRequest { email: input.email })
        .await
    {
        Ok(_) => tracing::info!(email = %masked, "Verification email re-sent"),
        Err(e) => tracing::warn!(email = %masked, error_kind = %e.kind(), "Verification email not sent: {}", e),
    }

    Json(MessageResponse::new(RESEND_VERIFICATION_MESSAGE))
}

fn message_or(reply: pb::MessageResponse, fallback: &str) -> MessageResponse {
    if reply.message.is_empty() {
        MessageResponse::new(fallback)
    } else {
        MessageResponse::new(reply.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::testing::{TOKEN, app, authenticate_as, call};
    use crate::error::RpcError;
    use crate::rpc::MockAccountRpc;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_forgot_password_answer_ignores_peer() {
        for outcome in [
            Ok(pb::MessageResponse::default()),
            Err(RpcError::new(ErrorKind::NotFound, "no such account")),
            Err(RpcError::new(ErrorKind::Internal, "mailer down")),
        ] {
            let mut mock = MockAccountRpc::new();
            mock.expect_forgot_password()
                .withf(|_, req| req.email == "nobody@nowhere")
                .times(1)
                .returning(move |_, _| outcome.clone());

            let (status, json) = call(
                app(mock),
                "POST",
                "/accounts/password/forgot",
                None,
                Some(json!({ "email": "nobody@nowhere" })),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, json!({ "message": FORGOT_PASSWORD_MESSAGE }));
        }
    }

    #[tokio::test]
    async fn test_resend_verification_answer_ignores_peer() {
        let mut mock = MockAccountRpc::new();
        mock.expect_resend_verification()
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "no such account")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/email/resend-verification",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], RESEND_VERIFICATION_MESSAGE);
    }

    #[tokio::test]
    async fn test_reset_checks_password_before_rpc() {
        let mut mock = MockAccountRpc::new();
        mock.expect_reset_password().never();

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/password/reset",
            None,
            Some(json!({ "token": "t", "new_password": "letters-only" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["fields"][0]["name"], "new_password");
    }

    #[tokio::test]
    async fn test_reset_with_stale_token() {
        let mut mock = MockAccountRpc::new();
        mock.expect_reset_password()
            .returning(|_, _| Err(RpcError::new(ErrorKind::Unauthorized, "token expired")));

        let (status, json) = call(
            app(mock),
            "POST",
            "/accounts/password/reset",
            None,
            Some(json!({ "token": "t", "new_password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], INVALID_RESET_TOKEN);
    }

    #[tokio::test]
    async fn test_change_password_forwards_principal() {
        let mut mock = MockAccountRpc::new();
        authenticate_as(&mut mock, 8, "user");
        mock.expect_change_password()
            .withf(|_, req| {
                req.user_id == 8 && req.current_password == "secret12" && req.new_password == "better34"
            })
            .times(1)
            .returning(|_, _| Err(RpcError::new(ErrorKind::Unauthorized, "hash mismatch")));

        let (status, json) = call(
            app(mock),
            "PUT",
            "/accounts/password/change",
            Some(TOKEN),
            Some(json!({ "current_password": "secret12", "new_password": "better34" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], WRONG_CURRENT_PASSWORD);
    }

    #[tokio::test]
    async fn test_change_password_rejects_reuse() {
        let mut mock = MockAccountRpc::new();
        authenticate_as(&mut mock, 8, "user");
        mock.expect_change_password().never();

        let (status, _) = call(
            app(mock),
            "PUT",
            "/accounts/password/change",
            Some(TOKEN),
            Some(json!({ "current_password": "secret12", "new_password": "secret12" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_verify_email_with_unknown_token() {
        let mut mock = MockAccountRpc::new();
        mock.expect_verify_email()
            .withf(|_, req| req.token == "abc")
            .returning(|_, _| Err(RpcError::new(ErrorKind::NotFound, "token not found")));

        let (status, json) = call(app(mock), "GET", "/accounts/email/verify/abc", None, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], INVALID_VERIFICATION_TOKEN);
    }
}
