use thiserror::Error;

pub type GrpcResult<T> = Result<T, GrpcError>;

/// Errors that can occur while building a gRPC channel
#[derive(Error, Debug)]
pub enum GrpcError {
  /// Invalid URI provided for connection
  #[error("Invalid URI: {0}")]
  InvalidUri(#[from] tonic::transport::Error),

  /// Invalid configuration
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),
}
