//! # gRPC Client Library
//!
//! Channel construction and call plumbing for talking to internal gRPC services.
//!
//! - **Channel creation**: lazily connected channels with HTTP/2 tuning
//! - **Correlation**: request ids and source service stamped on every call
//! - **Deadlines**: per-call `grpc-timeout` from the caller's remaining budget
//! - **Conversions**: protobuf scalar helpers (timestamps, proto3 presence)
//!
//! ## Quick Start
//! ```ignore
//! use grpc_client::{create_channel_lazy, ChannelConfig, ClientTracingInterceptor, prepare_request};
//! use rpc::accounts::account_service_client::AccountServiceClient;
//!
//! let channel = create_channel_lazy("http://127.0.0.1:50051", ChannelConfig::default())?;
//! let mut client = AccountServiceClient::with_interceptor(
//!     channel,
//!     ClientTracingInterceptor::with_service_name("accounts-gateway"),
//! );
//! let reply = client
//!     .find_account_by_id(prepare_request(request, "req-1", Duration::from_secs(5)))
//!     .await?;
//! ```

pub mod channel;
pub mod conversions;
pub mod error;
pub mod interceptor;
pub mod metadata;

pub use channel::{ChannelConfig, create_channel_lazy};
pub use error::{GrpcError, GrpcResult};
pub use interceptor::{ClientTracingInterceptor, REQUEST_ID_METADATA, SOURCE_SERVICE_METADATA};
pub use metadata::prepare_request;
