use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse_or, server::ServerConfig};
use std::time::Duration;

pub use core_config::Environment;

const DEFAULT_ACCOUNT_SERVICE_ADDR: &str = "http://127.0.0.1:50051";
const DEFAULT_GRPC_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Where the account service lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct AccountServiceConfig {
    pub addr: String,
    pub connect_timeout: Duration,
}

impl FromEnv for AccountServiceConfig {
    /// Reads `ACCOUNT_SERVICE_ADDR` and `GRPC_CONNECT_TIMEOUT_SECS`.
    fn from_env() -> Result<Self, ConfigError> {
        let addr = env_or_default("ACCOUNT_SERVICE_ADDR", DEFAULT_ACCOUNT_SERVICE_ADDR);
        if addr.trim().is_empty() {
            return Err(ConfigError::ParseError {
                key: "ACCOUNT_SERVICE_ADDR".to_string(),
                details: "must not be empty".to_string(),
            });
        }
        let connect_timeout =
            env_parse_or("GRPC_CONNECT_TIMEOUT_SECS", DEFAULT_GRPC_CONNECT_TIMEOUT_SECS)?;

        Ok(Self {
            addr,
            connect_timeout: Duration::from_secs(connect_timeout),
        })
    }
}

/// Gateway configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub account_service: AccountServiceConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080, REQUEST_TIMEOUT_SECS=30
        let account_service = AccountServiceConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            server,
            account_service,
            environment,
        })
    }
}
