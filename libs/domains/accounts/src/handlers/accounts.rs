//! Account CRUD, profile, directory and administration endpoints.
//! All of them sit behind the authentication filter.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_helpers::{
    AppError, ErrorKind, ErrorResponse, JsonBody, PathSegment, PositiveId, RequestContext,
};
use rpc::accounts as pb;
use validator::ValidateEmail;

use super::{ACCOUNT_NOT_FOUND, EMAIL_ALREADY_REGISTERED, mask_email, require_account};
use crate::binder::ValidatedBody;
use crate::error::RpcError;
use crate::extract::{Pagination, PaginationParams, SearchParams, SearchQuery};
use crate::gateway::AccountGateway;
use crate::models::{
    Account, AccountPage, AccountStatus, CreateAccountRequest, Principal, Role,
    StatusUpdateResponse, UpdateAccountRequest, UpdateStatusRequest,
};
use crate::validation::role_message;

pub const STATUS_TRANSITION_CONFLICT: &str = "disallowed status transition";

fn not_found_or(e: RpcError) -> AppError {
    match e.kind() {
        ErrorKind::NotFound => e.into_app_error_with(ACCOUNT_NOT_FOUND),
        _ => e.into(),
    }
}

async fn fetch_account(
    gateway: &AccountGateway,
    ctx: &RequestContext,
    id: i64,
    actor_id: i64,
) -> Result<Account, AppError> {
    let reply = gateway
        .rpc()
        .find_account_by_id(ctx, pb::FindAccountByIdRequest { id, actor_id })
        .await
        .map_err(not_found_or)?;
    require_account(reply.account, "FindAccountById")
}

// ============================================================================
// CRUD
// ============================================================================

/// POST /accounts - Create an account (admin only)
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_account(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    JsonBody(input): JsonBody<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Checked before validation: the email_unique rule would otherwise reach the peer.
    if !principal.is_admin() {
        tracing::info!(principal_id = principal.id, "Non-admin attempted account creation");
        return Err(AppError::Forbidden(
            "only administrators can create accounts".to_string(),
        ));
    }
    gateway.validators().validate_request(&ctx, &input).await?;

    tracing::info!(email = %mask_email(&input.email), role = %input.role, "Creating account");

    let reply = gateway
        .rpc()
        .create_account(
            &ctx,
            pb::CreateAccountRequest {
                actor_id: principal.id,
                branch_id: input.branch_id,
                name: input.name,
                email: input.email,
                password: input.password,
                role: input.role,
                avatar: input.avatar.unwrap_or_default(),
                title: input.title.unwrap_or_default(),
                owner_id: input.owner_id.unwrap_or_default(),
            },
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Conflict => e.into_app_error_with(EMAIL_ALREADY_REGISTERED),
            _ => e.into(),
        })?;

    let account = require_account(reply.account, "CreateAccount")?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /accounts/{id}
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn find_account_by_id(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PositiveId(id): PositiveId,
) -> Result<Json<Account>, AppError> {
    fetch_account(&gateway, &ctx, id, principal.id).await.map(Json)
}

/// PUT /accounts/{id} - Partial update
///
/// Only fields present in the body are forwarded. An empty body is a valid
/// no-op and the current record comes back.
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = Account),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_account(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PositiveId(id): PositiveId,
    ValidatedBody(input): ValidatedBody<UpdateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    let reply = gateway
        .rpc()
        .update_user_by_id(
            &ctx,
            pb::UpdateUserByIdRequest {
                id,
                actor_id: principal.id,
                branch_id: input.branch_id,
                name: input.name,
                email: input.email,
                avatar: input.avatar,
                title: input.title,
                role: input.role,
                owner_id: input.owner_id,
            },
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Conflict => e.into_app_error_with(EMAIL_ALREADY_REGISTERED),
            _ => not_found_or(e),
        })?;

    require_account(reply.account, "UpdateUserById").map(Json)
}

/// DELETE /accounts/{id}
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = "accounts",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_account(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PositiveId(id): PositiveId,
) -> Result<StatusCode, AppError> {
    gateway
        .rpc()
        .delete_user(
            &ctx,
            pb::DeleteUserRequest {
                id,
                actor_id: principal.id,
            },
        )
        .await
        .map_err(not_found_or)?;

    tracing::info!(account_id = id, principal_id = principal.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Profile
// ============================================================================

/// GET /accounts/profile - The caller's own record
#[utoipa::path(
    get,
    path = "/accounts/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Caller's account", body = Account),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_profile(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
) -> Result<Json<Account>, AppError> {
    fetch_account(&gateway, &ctx, principal.id, principal.id)
        .await
        .map(Json)
}

/// GET /accounts/profile/{id}
#[utoipa::path(
    get,
    path = "/accounts/profile/{id}",
    tag = "profile",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account profile", body = Account),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_profile_by_id(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PositiveId(id): PositiveId,
) -> Result<Json<Account>, AppError> {
    fetch_account(&gateway, &ctx, id, principal.id).await.map(Json)
}

// ============================================================================
// Directory
// ============================================================================

/// GET /accounts - One page of all accounts
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "directory",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of accounts", body = AccountPage),
        (status = 400, description = "Invalid pagination or query value", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn find_all(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    pagination: Pagination,
) -> Result<Json<AccountPage>, AppError> {
    let requested = pagination.to_proto();
    let reply = gateway
        .rpc()
        .find_all_users(
            &ctx,
            pb::FindAllUsersRequest {
                pagination: Some(requested),
                actor_id: principal.id,
            },
        )
        .await?;

    Ok(Json(AccountPage::from_list(reply, &requested)))
}

/// GET /accounts/search/email/{email}
#[utoipa::path(
    get,
    path = "/accounts/search/email/{email}",
    tag = "directory",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn find_by_email(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PathSegment(email): PathSegment,
) -> Result<Json<Account>, AppError> {
    if !email.validate_email() {
        return Err(AppError::BadRequest(
            "email must be a valid email address".to_string(),
        ));
    }

    let reply = gateway
        .rpc()
        .find_by_email(
            &ctx,
            pb::FindByEmailRequest {
                email,
                actor_id: principal.id,
            },
        )
        .await
        .map_err(not_found_or)?;

    require_account(reply.account, "FindByEmail").map(Json)
}

/// GET /accounts/search/role/{role}
#[utoipa::path(
    get,
    path = "/accounts/search/role/{role}",
    tag = "directory",
    params(
        ("role" = Role, Path, description = "Role to list"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Page of accounts", body = AccountPage),
        (status = 400, description = "Unknown role or invalid pagination", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn find_by_role(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PathSegment(role): PathSegment,
    pagination: Pagination,
) -> Result<Json<AccountPage>, AppError> {
    let role: Role = role
        .parse()
        .map_err(|_| AppError::BadRequest(format!("role {}", role_message())))?;

    let requested = pagination.to_proto();
    let reply = gateway
        .rpc()
        .find_by_role(
            &ctx,
            pb::FindByRoleRequest {
                role: role.as_str().to_string(),
                pagination: Some(requested),
                actor_id: principal.id,
            },
        )
        .await?;

    Ok(Json(AccountPage::from_list(reply, &requested)))
}

/// GET /accounts/branch/{branch_id}
///
/// Also served at `/accounts/branch/{branch_id}/users`.
#[utoipa::path(
    get,
    path = "/accounts/branch/{branch_id}",
    tag = "directory",
    params(
        ("branch_id" = i64, Path, description = "Branch id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Page of accounts", body = AccountPage),
        (status = 400, description = "Invalid branch id or pagination", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn find_by_branch(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PathSegment(raw): PathSegment,
    pagination: Pagination,
) -> Result<Json<AccountPage>, AppError> {
    let PositiveId(branch_id) = PositiveId::parse("branch_id", &raw)?;

    let requested = pagination.to_proto();
    let reply = gateway
        .rpc()
        .find_by_branch(
            &ctx,
            pb::FindByBranchRequest {
                branch_id,
                pagination: Some(requested),
                actor_id: principal.id,
            },
        )
        .await?;

    Ok(Json(AccountPage::from_list(reply, &requested)))
}

/// GET /accounts/search - Filtered, sorted directory search
#[utoipa::path(
    get,
    path = "/accounts/search",
    tag = "directory",
    params(SearchParams),
    responses(
        (status = 200, description = "Page of accounts", body = AccountPage),
        (status = 400, description = "Parameter outside its whitelist", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn search(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    query: SearchQuery,
) -> Result<Json<AccountPage>, AppError> {
    let request = query.to_proto(principal.id);
    let requested = query.pagination.to_proto();
    tracing::debug!(
        sort_by = query.sort_by,
        sort_order = query.sort_order.as_str(),
        statuses = query.statuses.len(),
        "Searching accounts"
    );

    let reply = gateway.rpc().search_users(&ctx, request).await?;
    Ok(Json(AccountPage::from_list(reply, &requested)))
}

// ============================================================================
// Administration
// ============================================================================

/// PUT /accounts/manage/{id}/status
#[utoipa::path(
    put,
    path = "/accounts/manage/{id}/status",
    tag = "admin",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = StatusUpdateResponse),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Disallowed status transition", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_status(
    State(gateway): State<AccountGateway>,
    ctx: RequestContext,
    principal: Principal,
    PositiveId(id): PositiveId,
    JsonBody(input): JsonBody<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let status: AccountStatus = input.status.trim().parse().map_err(|_| {
        AppError::BadRequest(
            "status must be one of active, inactive, suspended, pending".to_string(),
        )
    })?;

    let reply = gateway
        .rpc()
        .update_account_status(
            &ctx,
            pb::UpdateAccountStatusRequest {
                id,
                status: status.as_str().to_string(),
                actor_id: principal.id,
            },
        )
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::Conflict => e.into_app_error_with(STATUS_TRANSITION_CONFLICT),
            _ => not_found_or(e),
        })?;

    tracing::info!(account_id = id, status = %status, "Account status updated");
    Ok(Json(StatusUpdateResponse::from(reply)))
}
