use axum_helpers::errors::{ErrorBody, ErrorKind, ErrorResponse, FieldError};
use domain_accounts::handlers::{accounts, auth, password};
use domain_accounts::models;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&BearerAuth),
    info(
        title = "Accounts Gateway",
        description = "HTTP edge for the account service"
    ),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::refresh_token,
        auth::validate_token,
        password::forgot_password,
        password::reset_password,
        password::change_password,
        password::verify_email,
        password::resend_verification,
        accounts::create_account,
        accounts::find_account_by_id,
        accounts::update_account,
        accounts::delete_account,
        accounts::get_profile,
        accounts::get_profile_by_id,
        accounts::find_all,
        accounts::find_by_email,
        accounts::find_by_role,
        accounts::find_by_branch,
        accounts::search,
        accounts::update_status,
    ),
    components(schemas(
        models::Account,
        models::AccountPage,
        models::AccountStatus,
        models::Role,
        models::RegisterRequest,
        models::RegisterResponse,
        models::LoginRequest,
        models::LoginResponse,
        models::LogoutRequest,
        models::RefreshTokenRequest,
        models::RefreshTokenResponse,
        models::ValidateTokenResponse,
        models::EmailRequest,
        models::ResetPasswordRequest,
        models::ChangePasswordRequest,
        models::CreateAccountRequest,
        models::UpdateAccountRequest,
        models::UpdateStatusRequest,
        models::StatusUpdateResponse,
        models::MessageResponse,
        ErrorResponse,
        ErrorBody,
        ErrorKind,
        FieldError,
    )),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "password", description = "Password reset and change"),
        (name = "email", description = "Email verification"),
        (name = "accounts", description = "Account CRUD"),
        (name = "profile", description = "Account profiles"),
        (name = "directory", description = "Listing and search"),
        (name = "admin", description = "Account administration")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_operation() {
        let doc = ApiDoc::openapi();
        let operations: usize = doc
            .paths
            .paths
            .values()
            .map(|item| {
                [
                    item.get.is_some(),
                    item.post.is_some(),
                    item.put.is_some(),
                    item.delete.is_some(),
                ]
                .into_iter()
                .filter(|present| *present)
                .count()
            })
            .sum();
        assert_eq!(operations, 22);
        assert!(doc.paths.paths.contains_key("/accounts/manage/{id}/status"));
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
