//! In-memory account service for tests and local development.

use async_trait::async_trait;
use axum_helpers::{ErrorKind, RequestContext};
use chrono::Utc;
use rpc::accounts as pb;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RpcError, RpcResult};
use crate::models::AccountStatus;
use crate::rpc::AccountRpc;

const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone)]
struct StoredAccount {
    account: pb::Account,
    password: String,
    email_verified: bool,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    account_id: i64,
    expires_at: i64,
}

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    accounts: HashMap<i64, StoredAccount>,
    access_tokens: HashMap<String, Session>,
    refresh_tokens: HashMap<String, i64>,
    reset_tokens: HashMap<String, i64>,
    verification_tokens: HashMap<String, i64>,
}

impl Store {
    fn find_by_email(&self, email: &str) -> Option<&StoredAccount> {
        self.accounts
            .values()
            .find(|a| a.account.email.eq_ignore_ascii_case(email))
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.accounts
            .values()
            .any(|a| Some(a.account.id) != except && a.account.email.eq_ignore_ascii_case(email))
    }

    fn insert(&mut self, mut account: pb::Account, password: String) -> pb::Account {
        self.next_id += 1;
        let now = Utc::now().timestamp();
        account.id = self.next_id;
        account.created_at = now;
        account.updated_at = now;
        self.accounts.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                password,
                email_verified: false,
            },
        );
        self.verification_tokens.insert(new_token("verify"), account.id);
        account
    }

    fn issue_session(&mut self, account_id: i64) -> (String, String, i64) {
        let access = new_token("access");
        let refresh = new_token("refresh");
        let expires_at = Utc::now().timestamp() + ACCESS_TOKEN_TTL_SECS;
        self.access_tokens.insert(
            access.clone(),
            Session {
                account_id,
                expires_at,
            },
        );
        self.refresh_tokens.insert(refresh.clone(), account_id);
        (access, refresh, expires_at)
    }
}

fn new_token(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn not_found() -> RpcError {
    RpcError::new(ErrorKind::NotFound, "account not found")
}

fn page_of(accounts: Vec<pb::Account>, pagination: Option<pb::Pagination>) -> pb::ListAccountsResponse {
    let pagination = pagination.unwrap_or(pb::Pagination {
        page: 1,
        page_size: 10,
    });
    let page = pagination.page.max(1);
    let page_size = pagination.page_size.max(1);
    let offset = (page as usize - 1) * page_size as usize;

    pb::ListAccountsResponse {
        total_count: accounts.len() as i64,
        accounts: accounts
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect(),
        page,
        page_size,
    }
}

fn compare_by(field: &str, a: &pb::Account, b: &pb::Account) -> Ordering {
    match field {
        "id" => a.id.cmp(&b.id),
        "name" => a.name.cmp(&b.name),
        "email" => a.email.cmp(&b.email),
        "role" => a.role.cmp(&b.role),
        "status" => a.status.cmp(&b.status),
        "branch_id" => a.branch_id.cmp(&b.branch_id),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
    .then(a.id.cmp(&b.id))
}

/// Status transitions the fake accepts. Accounts only return to `pending`
/// from `pending`.
fn transition_allowed(from: &str, to: AccountStatus) -> bool {
    to != AccountStatus::Pending || from == AccountStatus::Pending.as_str()
}

/// In-memory [`AccountRpc`] with the observable behaviour of the account
/// service: uniqueness on email, opaque session tokens, status transitions.
///
/// Every call is recorded so tests can assert which RPCs were issued.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRpc {
    store: Arc<RwLock<Store>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    outage: Arc<Mutex<Option<RpcError>>>,
}

impl InMemoryAccountRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the RPCs issued so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Make every subsequent call fail with `err` (`None` restores service).
    pub fn set_outage(&self, err: Option<RpcError>) {
        if let Ok(mut outage) = self.outage.lock() {
            *outage = err;
        }
    }

    /// Insert an active account directly, bypassing the RPC surface.
    pub async fn seed(&self, name: &str, email: &str, password: &str, role: &str, branch_id: i64) -> pb::Account {
        let mut store = self.store.write().await;
        store.insert(
            pb::Account {
                branch_id,
                name: name.to_string(),
                email: email.to_string(),
                role: role.to_string(),
                status: AccountStatus::Active.as_str().to_string(),
                ..Default::default()
            },
            password.to_string(),
        )
    }

    /// Reset token issued for `email` by a previous ForgotPassword call.
    pub async fn reset_token_for(&self, email: &str) -> Option<String> {
        let store = self.store.read().await;
        let id = store.find_by_email(email)?.account.id;
        store
            .reset_tokens
            .iter()
            .find(|(_, owner)| **owner == id)
            .map(|(token, _)| token.clone())
    }

    /// Outstanding verification token for `email`.
    pub async fn verification_token_for(&self, email: &str) -> Option<String> {
        let store = self.store.read().await;
        let id = store.find_by_email(email)?.account.id;
        store
            .verification_tokens
            .iter()
            .find(|(_, owner)| **owner == id)
            .map(|(token, _)| token.clone())
    }

    fn record(&self, method: &'static str) -> RpcResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(method);
        }
        match self.outage.lock() {
            Ok(outage) => outage.clone().map_or(Ok(()), Err),
            Err(_) => Ok(()),
        }
    }

    async fn list_filtered<F>(&self, filter: F) -> Vec<pb::Account>
    where
        F: Fn(&pb::Account) -> bool,
    {
        let store = self.store.read().await;
        let mut accounts: Vec<pb::Account> = store
            .accounts
            .values()
            .map(|s| s.account.clone())
            .filter(|a| filter(a))
            .collect();
        accounts.sort_by_key(|a| a.id);
        accounts
    }
}

#[async_trait]
impl AccountRpc for InMemoryAccountRpc {
    async fn register(
        &self,
        _ctx: &RequestContext,
        req: pb::RegisterRequest,
    ) -> RpcResult<pb::RegisterResponse> {
        self.record("Register")?;
        let mut store = self.store.write().await;
        if store.email_taken(&req.email, None) {
            return Err(RpcError::new(ErrorKind::Conflict, "email already exists"));
        }

        let account = store.insert(
            pb::Account {
                branch_id: req.branch_id,
                name: req.name,
                email: req.email,
                avatar: req.avatar,
                title: req.title,
                role: "user".to_string(),
                status: AccountStatus::Active.as_str().to_string(),
                ..Default::default()
            },
            req.password,
        );

        Ok(pb::RegisterResponse {
            account: Some(account),
            access_token: None,
            refresh_token: None,
        })
    }

    async fn login(&self, _ctx: &RequestContext, req: pb::LoginRequest) -> RpcResult<pb::LoginResponse> {
        self.record("Login")?;
        let mut store = self.store.write().await;
        let stored = store
            .find_by_email(&req.email)
            .filter(|s| s.password == req.password)
            .cloned()
            .ok_or_else(|| RpcError::new(ErrorKind::Unauthorized, "invalid credentials"))?;

        if stored.account.status != AccountStatus::Active.as_str() {
            return Err(RpcError::new(
                ErrorKind::Forbidden,
                format!("account is {}", stored.account.status),
            ));
        }

        let (access_token, refresh_token, expires_at) = store.issue_session(stored.account.id);
        Ok(pb::LoginResponse {
            access_token,
            refresh_token,
            expires_at,
            account: Some(stored.account),
        })
    }

    async fn logout(&self, _ctx: &RequestContext, req: pb::LogoutRequest) -> RpcResult<pb::MessageResponse> {
        self.record("Logout")?;
        let mut store = self.store.write().await;
        match store.access_tokens.remove(&req.token) {
            Some(_) => Ok(pb::MessageResponse {
                message: "logged out".to_string(),
            }),
            None => Err(RpcError::new(ErrorKind::NotFound, "session not found")),
        }
    }

    async fn refresh_token(
        &self,
        _ctx: &RequestContext,
        req: pb::RefreshTokenRequest,
    ) -> RpcResult<pb::RefreshTokenResponse> {
        self.record("RefreshToken")?;
        let mut store = self.store.write().await;
        let account_id = store
            .refresh_tokens
            .remove(&req.refresh_token)
            .ok_or_else(|| RpcError::new(ErrorKind::Unauthorized, "refresh token not recognised"))?;

        let (access_token, refresh_token, expires_at) = store.issue_session(account_id);
        Ok(pb::RefreshTokenResponse {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    async fn validate_token(
        &self,
        _ctx: &RequestContext,
        req: pb::ValidateTokenRequest,
    ) -> RpcResult<pb::ValidateTokenResponse> {
        self.record("ValidateToken")?;
        let store = self.store.read().await;
        let session = store
            .access_tokens
            .get(&req.token)
            .copied()
            .filter(|s| s.expires_at > Utc::now().timestamp());

        let Some(session) = session else {
            return Ok(pb::ValidateTokenResponse {
                valid: false,
                message: "token is invalid or expired".to_string(),
                ..Default::default()
            });
        };
        let account = store
            .accounts
            .get(&session.account_id)
            .map(|s| s.account.clone())
            .unwrap_or_default();

        Ok(pb::ValidateTokenResponse {
            valid: true,
            user_id: session.account_id,
            role: account.role,
            branch_id: account.branch_id,
            expires_at: session.expires_at,
            message: String::new(),
        })
    }

    async fn create_account(
        &self,
        _ctx: &RequestContext,
        req: pb::CreateAccountRequest,
    ) -> RpcResult<pb::AccountResponse> {
        self.record("CreateAccount")?;
        let mut store = self.store.write().await;
        if store.email_taken(&req.email, None) {
            return Err(RpcError::new(ErrorKind::Conflict, "email already exists"));
        }

        let account = store.insert(
            pb::Account {
                branch_id: req.branch_id,
                name: req.name,
                email: req.email,
                avatar: req.avatar,
                title: req.title,
                role: req.role,
                owner_id: if req.owner_id > 0 { req.owner_id } else { req.actor_id },
                status: AccountStatus::Active.as_str().to_string(),
                ..Default::default()
            },
            req.password,
        );
        Ok(pb::AccountResponse {
            account: Some(account),
        })
    }

    async fn find_account_by_id(
        &self,
        _ctx: &RequestContext,
        req: pb::FindAccountByIdRequest,
    ) -> RpcResult<pb::AccountResponse> {
        self.record("FindAccountById")?;
        let store = self.store.read().await;
        let account = store.accounts.get(&req.id).ok_or_else(not_found)?;
        Ok(pb::AccountResponse {
            account: Some(account.account.clone()),
        })
    }

    async fn find_by_email(
        &self,
        _ctx: &RequestContext,
        req: pb::FindByEmailRequest,
    ) -> RpcResult<pb::AccountResponse> {
        self.record("FindByEmail")?;
        let store = self.store.read().await;
        let account = store.find_by_email(&req.email).ok_or_else(not_found)?;
        Ok(pb::AccountResponse {
            account: Some(account.account.clone()),
        })
    }

    async fn find_all_users(
        &self,
        _ctx: &RequestContext,
        req: pb::FindAllUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        self.record("FindAllUsers")?;
        let accounts = self.list_filtered(|_| true).await;
        Ok(page_of(accounts, req.pagination))
    }

    async fn update_user_by_id(
        &self,
        _ctx: &RequestContext,
        req: pb::UpdateUserByIdRequest,
    ) -> RpcResult<pb::AccountResponse> {
        self.record("UpdateUserById")?;
        let mut store = self.store.write().await;
        if let Some(ref email) = req.email {
            if store.email_taken(email, Some(req.id)) {
                return Err(RpcError::new(ErrorKind::Conflict, "email already exists"));
            }
        }

        let stored = store.accounts.get_mut(&req.id).ok_or_else(not_found)?;
        let before = stored.account.clone();
        let account = &mut stored.account;
        if let Some(branch_id) = req.branch_id {
            account.branch_id = branch_id;
        }
        if let Some(name) = req.name {
            account.name = name;
        }
        if let Some(email) = req.email {
            account.email = email;
        }
        if let Some(avatar) = req.avatar {
            account.avatar = avatar;
        }
        if let Some(title) = req.title {
            account.title = title;
        }
        if let Some(role) = req.role {
            account.role = role;
        }
        if let Some(owner_id) = req.owner_id {
            account.owner_id = owner_id;
        }
        if *account != before {
            account.updated_at = Utc::now().timestamp();
        }

        Ok(pb::AccountResponse {
            account: Some(account.clone()),
        })
    }

    async fn update_account_status(
        &self,
        _ctx: &RequestContext,
        req: pb::UpdateAccountStatusRequest,
    ) -> RpcResult<pb::UpdateAccountStatusResponse> {
        self.record("UpdateAccountStatus")?;
        let target: AccountStatus = req
            .status
            .parse()
            .map_err(|e: String| RpcError::new(ErrorKind::BadRequest, e))?;

        let mut store = self.store.write().await;
        let stored = store.accounts.get_mut(&req.id).ok_or_else(not_found)?;
        if !transition_allowed(&stored.account.status, target) {
            return Err(RpcError::new(
                ErrorKind::Conflict,
                format!("cannot move from {} to {}", stored.account.status, target),
            ));
        }

        stored.account.status = target.as_str().to_string();
        stored.account.updated_at = Utc::now().timestamp();
        Ok(pb::UpdateAccountStatusResponse {
            id: req.id,
            status: stored.account.status.clone(),
            message: "status updated".to_string(),
        })
    }

    async fn delete_user(
        &self,
        _ctx: &RequestContext,
        req: pb::DeleteUserRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("DeleteUser")?;
        let mut store = self.store.write().await;
        store.accounts.remove(&req.id).ok_or_else(not_found)?;
        store.access_tokens.retain(|_, s| s.account_id != req.id);
        store.refresh_tokens.retain(|_, id| *id != req.id);
        Ok(pb::MessageResponse {
            message: "account deleted".to_string(),
        })
    }

    async fn change_password(
        &self,
        _ctx: &RequestContext,
        req: pb::ChangePasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("ChangePassword")?;
        let mut store = self.store.write().await;
        let stored = store.accounts.get_mut(&req.user_id).ok_or_else(not_found)?;
        if stored.password != req.current_password {
            return Err(RpcError::new(ErrorKind::Unauthorized, "password mismatch"));
        }
        stored.password = req.new_password;
        Ok(pb::MessageResponse {
            message: "password changed".to_string(),
        })
    }

    async fn forgot_password(
        &self,
        _ctx: &RequestContext,
        req: pb::ForgotPasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("ForgotPassword")?;
        let mut store = self.store.write().await;
        let id = store.find_by_email(&req.email).ok_or_else(not_found)?.account.id;
        store.reset_tokens.insert(new_token("reset"), id);
        Ok(pb::MessageResponse {
            message: "reset link sent".to_string(),
        })
    }

    async fn reset_password(
        &self,
        _ctx: &RequestContext,
        req: pb::ResetPasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("ResetPassword")?;
        let mut store = self.store.write().await;
        let id = store
            .reset_tokens
            .remove(&req.token)
            .ok_or_else(|| RpcError::new(ErrorKind::NotFound, "reset token not found"))?;
        let stored = store.accounts.get_mut(&id).ok_or_else(not_found)?;
        stored.password = req.new_password;
        Ok(pb::MessageResponse {
            message: "password reset".to_string(),
        })
    }

    async fn verify_email(
        &self,
        _ctx: &RequestContext,
        req: pb::VerifyEmailRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("VerifyEmail")?;
        let mut store = self.store.write().await;
        let id = store
            .verification_tokens
            .remove(&req.token)
            .ok_or_else(|| RpcError::new(ErrorKind::BadRequest, "verification token not found"))?;
        let stored = store.accounts.get_mut(&id).ok_or_else(not_found)?;
        stored.email_verified = true;
        Ok(pb::MessageResponse {
            message: "email verified".to_string(),
        })
    }

    async fn resend_verification(
        &self,
        _ctx: &RequestContext,
        req: pb::ResendVerificationRequest,
    ) -> RpcResult<pb::MessageResponse> {
        self.record("ResendVerification")?;
        let mut store = self.store.write().await;
        let stored = store.find_by_email(&req.email).ok_or_else(not_found)?;
        if stored.email_verified {
            return Err(RpcError::new(ErrorKind::Conflict, "email already verified"));
        }
        let id = stored.account.id;
        store.verification_tokens.retain(|_, owner| *owner != id);
        store.verification_tokens.insert(new_token("verify"), id);
        Ok(pb::MessageResponse {
            message: "verification sent".to_string(),
        })
    }

    async fn find_by_role(
        &self,
        _ctx: &RequestContext,
        req: pb::FindByRoleRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        self.record("FindByRole")?;
        let accounts = self.list_filtered(|a| a.role == req.role).await;
        Ok(page_of(accounts, req.pagination))
    }

    async fn find_by_branch(
        &self,
        _ctx: &RequestContext,
        req: pb::FindByBranchRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        self.record("FindByBranch")?;
        let accounts = self.list_filtered(|a| a.branch_id == req.branch_id).await;
        Ok(page_of(accounts, req.pagination))
    }

    async fn search_users(
        &self,
        _ctx: &RequestContext,
        req: pb::SearchUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        self.record("SearchUsers")?;
        let query = req.query.to_lowercase();
        let mut accounts = self
            .list_filtered(|a| {
                (query.is_empty()
                    || a.name.to_lowercase().contains(&query)
                    || a.email.to_lowercase().contains(&query))
                    && req.role.as_ref().is_none_or(|r| &a.role == r)
                    && req.branch_id.is_none_or(|b| a.branch_id == b)
                    && (req.status.is_empty() || req.status.contains(&a.status))
            })
            .await;

        let sort = req.sort.unwrap_or_default();
        accounts.sort_by(|a, b| compare_by(&sort.sort_by, a, b));
        if sort.sort_order != "asc" {
            accounts.reverse();
        }
        Ok(page_of(accounts, req.pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx() -> RequestContext {
        RequestContext::new("test", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_register_then_duplicate_conflicts() {
        let rpc = InMemoryAccountRpc::new();
        let req = pb::RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret12".into(),
            ..Default::default()
        };

        let created = rpc.register(&ctx(), req.clone()).await.unwrap();
        assert_eq!(created.account.unwrap().id, 1);

        let err = rpc.register(&ctx(), req).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        assert_eq!(rpc.calls(), vec!["Register", "Register"]);
    }

    #[tokio::test]
    async fn test_login_session_validates() {
        let rpc = InMemoryAccountRpc::new();
        rpc.seed("Ada", "ada@example.com", "secret12", "admin", 3).await;

        let login = rpc
            .login(
                &ctx(),
                pb::LoginRequest {
                    email: "ADA@example.com".into(),
                    password: "secret12".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let check = rpc
            .validate_token(
                &ctx(),
                pb::ValidateTokenRequest {
                    token: login.access_token,
                },
            )
            .await
            .unwrap();
        assert!(check.valid);
        assert_eq!(check.role, "admin");
        assert_eq!(check.branch_id, 3);
    }

    #[tokio::test]
    async fn test_suspended_cannot_return_to_pending() {
        let rpc = InMemoryAccountRpc::new();
        let account = rpc.seed("Bo", "bo@example.com", "secret12", "user", 1).await;

        let status = |s: &str| pb::UpdateAccountStatusRequest {
            id: account.id,
            status: s.to_string(),
            actor_id: 99,
        };
        rpc.update_account_status(&ctx(), status("suspended")).await.unwrap();
        let err = rpc
            .update_account_status(&ctx(), status("pending"))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_outage_fails_every_call() {
        let rpc = InMemoryAccountRpc::new();
        rpc.set_outage(Some(RpcError::new(ErrorKind::Internal, "unavailable")));
        let err = rpc
            .find_by_email(
                &ctx(),
                pb::FindByEmailRequest {
                    email: "x@example.com".into(),
                    actor_id: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Internal));
        assert_eq!(rpc.call_count(), 1);
    }

    #[tokio::test]
    async fn test_search_sorts_and_pages() {
        let rpc = InMemoryAccountRpc::new();
        rpc.seed("Carol", "carol@example.com", "secret12", "user", 1).await;
        rpc.seed("Alice", "alice@example.com", "secret12", "user", 1).await;
        rpc.seed("Bob", "bob@example.com", "secret12", "manager", 2).await;

        let resp = rpc
            .search_users(
                &ctx(),
                pb::SearchUsersRequest {
                    role: Some("user".into()),
                    sort: Some(pb::SortOptions {
                        sort_by: "name".into(),
                        sort_order: "asc".into(),
                    }),
                    pagination: Some(pb::Pagination {
                        page: 1,
                        page_size: 1,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.total_count, 2);
        assert_eq!(resp.accounts.len(), 1);
        assert_eq!(resp.accounts[0].name, "Alice");
    }
}
