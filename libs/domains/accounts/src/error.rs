use axum_helpers::{AppError, ErrorKind};
use thiserror::Error;

/// Failure reported by the account service, already classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("{kind}: {message}")]
    Status { kind: ErrorKind, message: String },

    /// The request deadline expired before the peer answered.
    #[error("upstream timeout")]
    Timeout,
}

pub type RpcResult<T> = Result<T, RpcError>;

impl RpcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RpcError::Status {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Status { kind, .. } => *kind,
            RpcError::Timeout => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RpcError::Status { message, .. } => message,
            RpcError::Timeout => "upstream timeout",
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn is_any(&self, kinds: &[ErrorKind]) -> bool {
        kinds.contains(&self.kind())
    }

    /// Keep the kind, replace the client-facing message.
    ///
    /// `Internal` errors keep their detail for the log; the envelope never
    /// shows it anyway.
    pub fn into_app_error_with(self, message: &str) -> AppError {
        match self {
            RpcError::Status {
                kind: ErrorKind::Internal,
                message: detail,
            } => AppError::Internal(detail),
            RpcError::Status { kind, .. } => AppError::from_kind(kind, message),
            RpcError::Timeout => AppError::UpstreamTimeout,
        }
    }
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Status { kind, message } => AppError::from_kind(kind, message),
            RpcError::Timeout => AppError::UpstreamTimeout,
        }
    }
}
