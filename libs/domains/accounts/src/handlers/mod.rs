//! Account Gateway: one handler per HTTP operation.
//!
//! Each handler binds its input, calls the account service under the request
//! deadline and chooses the client-facing message for the peer's error kind.
//! The kind itself is never changed, except where a public endpoint must not
//! reveal whether an account exists.

pub mod accounts;
pub mod auth;
pub mod password;

use axum_helpers::AppError;
use rpc::accounts as pb;

use crate::models::Account;

pub const ACCOUNT_NOT_FOUND: &str = "account not found";
pub const EMAIL_ALREADY_REGISTERED: &str = "email already registered";

/// Unwrap the record the peer must send with a successful reply.
pub(crate) fn require_account(account: Option<pb::Account>, method: &str) -> Result<Account, AppError> {
    account
        .map(Account::from)
        .ok_or_else(|| AppError::Internal(format!("{method} reply carried no account")))
}

/// `alice@example.com` → `a***@example.com`, safe to log.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        _ => "***".to_string(),
    }
}


/// Router plumbing shared by the handler tests.
#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use rpc::accounts as pb;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::gateway::AccountGateway;
    use crate::rpc::MockAccountRpc;

    pub const TOKEN: &str = "access-token";

    /// Accept [`TOKEN`] as the session of account `user_id` with `role`.
    pub fn authenticate_as(mock: &mut MockAccountRpc, user_id: i64, role: &'static str) {
        mock.expect_validate_token()
            .withf(|_, req| req.token == TOKEN)
            .returning(move |_, _| {
                Ok(pb::ValidateTokenResponse {
                    valid: true,
                    user_id,
                    role: role.to_string(),
                    ..Default::default()
                })
            });
    }

    pub fn app(mock: MockAccountRpc) -> Router {
        crate::routes::router(AccountGateway::new(Arc::new(mock)))
    }

    pub async fn call(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    pub fn account(id: i64, email: &str) -> pb::Account {
        pb::Account {
            id,
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            role: "user".to_string(),
            status: "active".to_string(),
            created_at: 1_700_000_000,
            ..Default::default()
        }
    }
}
