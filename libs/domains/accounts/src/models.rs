use chrono::{DateTime, Utc};
use grpc_client::conversions::{non_empty, non_zero, timestamp_to_datetime};
use rpc::accounts as pb;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Account roles accepted at the edge. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Manager => "manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
    Pending,
}

impl AccountStatus {
    pub const ALL: [AccountStatus; 4] = [
        AccountStatus::Active,
        AccountStatus::Inactive,
        AccountStatus::Suspended,
        AccountStatus::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

/// Authenticated subject of a request, placed in the request extensions by
/// the authentication middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Option<Role>,
    pub branch_id: Option<i64>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

/// Account record as seen at the edge. The account service is the system of
/// record; role and status are passed through as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: i64,
    pub branch_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub title: Option<String>,
    pub role: String,
    pub owner_id: Option<i64>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<pb::Account> for Account {
    fn from(account: pb::Account) -> Self {
        Self {
            id: account.id,
            branch_id: non_zero(account.branch_id),
            name: account.name,
            email: account.email,
            avatar: non_empty(account.avatar),
            title: non_empty(account.title),
            role: account.role,
            owner_id: non_zero(account.owner_id),
            status: account.status,
            created_at: timestamp_to_datetime(account.created_at),
            updated_at: timestamp_to_datetime(account.updated_at),
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// Self-service registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: String,
    /// Checked by the `password` rule
    #[serde(default)]
    pub password: String,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub branch_id: Option<i64>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub avatar: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Token to revoke. Falls back to the bearer header when absent.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

/// Body shared by forgot-password and resend-verification. Only presence is
/// checked so the reply never hints at which addresses are real.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Administrative account creation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub branch_id: i64,
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub avatar: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub owner_id: Option<i64>,
}

/// Partial update. Absent fields are left untouched; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub branch_id: Option<i64>,
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub email: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub avatar: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
    pub role: Option<String>,
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: Account,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<pb::RefreshTokenResponse> for RefreshTokenResponse {
    fn from(resp: pb::RefreshTokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: non_empty(resp.refresh_token),
            expires_at: timestamp_to_datetime(resp.expires_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateTokenResponse {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            user_id: None,
            role: None,
            expires_at: None,
            message: Some(message.into()),
        }
    }
}

impl From<pb::ValidateTokenResponse> for ValidateTokenResponse {
    fn from(resp: pb::ValidateTokenResponse) -> Self {
        if !resp.valid {
            return Self::invalid(
                non_empty(resp.message).unwrap_or_else(|| "invalid or expired token".to_string()),
            );
        }
        Self {
            valid: true,
            user_id: non_zero(resp.user_id),
            role: non_empty(resp.role),
            expires_at: timestamp_to_datetime(resp.expires_at),
            message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub id: i64,
    pub status: String,
    pub message: String,
}

impl From<pb::UpdateAccountStatusResponse> for StatusUpdateResponse {
    fn from(resp: pb::UpdateAccountStatusResponse) -> Self {
        Self {
            id: resp.id,
            status: resp.status,
            message: resp.message,
        }
    }
}

/// One page of accounts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountPage {
    pub items: Vec<Account>,
    pub page: i32,
    pub page_size: i32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl AccountPage {
    /// Builds the page from the peer's reply, falling back to the requested
    /// cursor when the peer leaves page fields unset.
    pub fn from_list(resp: pb::ListAccountsResponse, requested: &pb::Pagination) -> Self {
        let page = if resp.page > 0 { resp.page } else { requested.page };
        let page_size = if resp.page_size > 0 {
            resp.page_size
        } else {
            requested.page_size
        };
        let total = resp.total_count.max(0);
        // Peer-supplied total may sit near i64::MAX; no addition before dividing.
        let total_pages = if page_size > 0 {
            let size = i64::from(page_size);
            total / size + i64::from(total % size != 0)
        } else {
            0
        };

        Self {
            items: resp.accounts.into_iter().map(Account::from).collect(),
            page,
            page_size,
            total,
            total_pages,
            has_next: i64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_case_sensitive() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("Admin".parse::<Role>().is_err());
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "suspended".parse::<AccountStatus>().unwrap(),
            AccountStatus::Suspended
        );
        assert!("banana".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn test_account_from_proto_maps_unset_fields() {
        let account = Account::from(pb::Account {
            id: 7,
            branch_id: 0,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: String::new(),
            title: "Engineer".into(),
            role: "user".into(),
            owner_id: 0,
            status: "active".into(),
            created_at: 1_700_000_000,
            updated_at: 0,
        });

        assert_eq!(account.branch_id, None);
        assert_eq!(account.avatar, None);
        assert_eq!(account.title.as_deref(), Some("Engineer"));
        assert!(account.created_at.is_some());
        assert!(account.updated_at.is_none());
    }

    #[test]
    fn test_page_math() {
        let requested = pb::Pagination {
            page: 2,
            page_size: 10,
        };
        let page = AccountPage::from_list(
            pb::ListAccountsResponse {
                accounts: vec![],
                total_count: 25,
                page: 0,
                page_size: 0,
            },
            &requested,
        );

        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_page_math_survives_huge_totals() {
        let requested = pb::Pagination {
            page: 1,
            page_size: 10,
        };
        let page = AccountPage::from_list(
            pb::ListAccountsResponse {
                accounts: vec![],
                total_count: i64::MAX,
                page: 1,
                page_size: 10,
            },
            &requested,
        );

        assert_eq!(page.total, i64::MAX);
        assert_eq!(page.total_pages, i64::MAX / 10 + 1);
        assert!(page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn test_register_request_missing_fields_default_to_empty() {
        let body: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"pw1"}"#).unwrap();
        assert_eq!(body.name, "");
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(!errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_validate_token_response_from_rejection() {
        let resp = ValidateTokenResponse::from(pb::ValidateTokenResponse {
            valid: false,
            ..Default::default()
        });
        assert!(!resp.valid);
        assert_eq!(resp.message.as_deref(), Some("invalid or expired token"));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("user_id").is_none());
    }
}
