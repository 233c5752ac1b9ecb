use std::convert::Infallible;

use axum::{
    Router,
    extract::Request,
    middleware,
    response::IntoResponse,
    routing::{Route, get, post, put},
};
use tower::{Layer, Service, layer::util::Identity};

use crate::auth::require_auth;
use crate::gateway::AccountGateway;
use crate::handlers::{accounts, auth, password};

/// Routes reachable without a token.
fn public_routes() -> Router<AccountGateway> {
    Router::new()
        .route("/accounts/auth/register", post(auth::register))
        .route("/accounts/auth/login", post(auth::login))
        .route("/accounts/auth/logout", post(auth::logout))
        .route("/accounts/auth/refresh-token", post(auth::refresh_token))
        .route("/accounts/auth/validate-token", post(auth::validate_token))
        .route("/accounts/password/forgot", post(password::forgot_password))
        .route("/accounts/password/reset", post(password::reset_password))
        .route("/accounts/email/verify/{token}", get(password::verify_email))
        .route(
            "/accounts/email/resend-verification",
            post(password::resend_verification),
        )
}

/// Routes behind the bearer-token filter.
fn protected_routes(gateway: &AccountGateway) -> Router<AccountGateway> {
    Router::new()
        .route("/accounts/password/change", put(password::change_password))
        .route(
            "/accounts",
            get(accounts::find_all).post(accounts::create_account),
        )
        .route(
            "/accounts/",
            get(accounts::find_all).post(accounts::create_account),
        )
        .route(
            "/accounts/{id}",
            get(accounts::find_account_by_id)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/profile", get(accounts::get_profile))
        .route("/accounts/profile/{id}", get(accounts::get_profile_by_id))
        .route("/accounts/search", get(accounts::search))
        .route("/accounts/search/email/{email}", get(accounts::find_by_email))
        .route("/accounts/search/role/{role}", get(accounts::find_by_role))
        .route("/accounts/branch/{branch_id}", get(accounts::find_by_branch))
        .route(
            "/accounts/branch/{branch_id}/users",
            get(accounts::find_by_branch),
        )
        .route("/accounts/manage/{id}/status", put(accounts::update_status))
        .route_layer(middleware::from_fn_with_state(gateway.clone(), require_auth))
}

/// All account routes with their state applied.
pub fn router(gateway: AccountGateway) -> Router {
    router_with_layer(gateway, Identity::new())
}

/// Like [`router`], with `layer` wrapped around every account route.
///
/// This is the hook for request throttling; the layer runs before the
/// authentication filter.
///
/// ```ignore
/// let limited = domain_accounts::router_with_layer(gateway, my_rate_limit_layer);
/// ```
pub fn router_with_layer<L>(gateway: AccountGateway, layer: L) -> Router
where
    L: Layer<Route> + Clone + Send + Sync + 'static,
    L::Service: Service<Request> + Clone + Send + Sync + 'static,
    <L::Service as Service<Request>>::Response: IntoResponse + 'static,
    <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    public_routes()
        .merge(protected_routes(&gateway))
        .route_layer(layer)
        .with_state(gateway)
}
