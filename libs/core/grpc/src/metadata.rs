//! Per-call request preparation.

use crate::interceptor::REQUEST_ID_METADATA;
use std::time::Duration;
use tonic::Request;

/// Wrap `message` for a unary call, carrying the caller's correlation id and
/// deadline.
///
/// The timeout is sent as the `grpc-timeout` header so the peer can give up
/// too; the caller still bounds the local wait itself. A request id that is not
/// valid ASCII metadata is dropped and the interceptor generates one instead.
pub fn prepare_request<T>(message: T, request_id: &str, timeout: Duration) -> Request<T> {
    let mut request = Request::new(message);
    request.set_timeout(timeout);
    match request_id.parse() {
        Ok(value) => {
            request.metadata_mut().insert(REQUEST_ID_METADATA, value);
        }
        Err(_) => {
            tracing::debug!(target: "grpc_client", "Request id is not valid gRPC metadata");
        }
    }
    request
}
