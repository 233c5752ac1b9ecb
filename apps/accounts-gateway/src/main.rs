use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_accounts::{AccountGateway, GrpcAccountRpc};
use grpc_client::{ChannelConfig, create_channel_lazy};
use std::sync::Arc;
use tracing::info;

mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before anything fallible, so start-up errors get colored reports.
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        "Account service at {} (connect timeout {:?}, request budget {:?})",
        config.account_service.addr,
        config.account_service.connect_timeout,
        config.server.request_timeout,
    );

    // Lazy: the gateway starts even when the account service is still down.
    let channel = create_channel_lazy(
        config.account_service.addr.clone(),
        ChannelConfig::new()
            .with_connect_timeout(config.account_service.connect_timeout)
            .with_request_timeout(config.server.request_timeout),
    )?;
    let gateway = AccountGateway::new(Arc::new(GrpcAccountRpc::new(channel)));
    info!(validators = ?gateway.validators(), "Account gateway ready");

    let api_routes = domain_accounts::router(gateway).merge(health_router(config.app));
    let app = create_router::<openapi::ApiDoc>(api_routes, &config.server)?;

    create_app(app, &config.server).await?;

    info!("{} shutdown complete", config.app.name);
    Ok(())
}
