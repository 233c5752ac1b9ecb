pub mod config;

pub use config::ChannelConfig;

use crate::error::{GrpcError, GrpcResult};
use tonic::transport::{Channel, Endpoint};

/// Creates a lazy gRPC channel that connects on first request
///
/// Returns immediately; the connection is made by the first RPC and re-made
/// transparently after failures. The gateway starts even when the account
/// service is not yet reachable and reports `Internal` per request until it is.
///
/// ## Example
/// ```ignore
/// use grpc_client::{create_channel_lazy, ChannelConfig};
/// use rpc::accounts::account_service_client::AccountServiceClient;
///
/// let channel = create_channel_lazy("http://127.0.0.1:50051", ChannelConfig::default())?;
/// let client = AccountServiceClient::new(channel);
/// ```
pub fn create_channel_lazy(addr: impl Into<String>, config: ChannelConfig) -> GrpcResult<Channel> {
  let addr_string = addr.into();
  if addr_string.trim().is_empty() {
    return Err(GrpcError::InvalidConfig("address is empty".to_string()));
  }

  let endpoint = Endpoint::from_shared(addr_string.clone()).map_err(|e| {
    tracing::error!(target: "grpc_client", addr = %addr_string, error = ?e, "Invalid URI");
    GrpcError::InvalidUri(e)
  })?;

  let endpoint = config.configure(endpoint);

  tracing::debug!(
    target: "grpc_client",
    addr = %addr_string,
    "Creating lazy gRPC channel (connects on first request)"
  );

  Ok(endpoint.connect_lazy())
}
