//! Client-side correlation interceptor.

use tonic::metadata::MetadataValue;
use tonic::{Request, Status};

pub const REQUEST_ID_METADATA: &str = "x-request-id";
pub const SOURCE_SERVICE_METADATA: &str = "x-source-service";

/// Stamps every outgoing call with the calling service's name and makes sure
/// it carries an `x-request-id`.
///
/// Callers normally set the inbound HTTP request id themselves (see
/// [`crate::metadata::prepare_request`]); the interceptor only generates one
/// when nothing upstream did, so calls issued outside a request still correlate.
///
/// ```ignore
/// let client = AccountServiceClient::with_interceptor(
///     channel,
///     ClientTracingInterceptor::with_service_name("accounts-gateway"),
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct ClientTracingInterceptor {
    service_name: Option<String>,
}

impl ClientTracingInterceptor {
    pub fn new() -> Self {
        Self { service_name: None }
    }

    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
        }
    }
}

impl tonic::service::Interceptor for ClientTracingInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(ref name) = self.service_name {
            if let Ok(value) = name.parse() {
                request.metadata_mut().insert(SOURCE_SERVICE_METADATA, value);
            }
        }

        if !request.metadata().contains_key(REQUEST_ID_METADATA) {
            let request_id = uuid::Uuid::new_v4().to_string();
            let value: MetadataValue<_> = request_id
                .parse()
                .map_err(|_| Status::internal("Failed to create request ID"))?;
            request.metadata_mut().insert(REQUEST_ID_METADATA, value);
            tracing::debug!(
                target: "grpc_client",
                request_id = %request_id,
                "Outgoing gRPC request without inbound correlation id"
            );
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::service::Interceptor;

    #[test]
    fn test_generates_request_id_when_absent() {
        let mut interceptor = ClientTracingInterceptor::with_service_name("accounts-gateway");
        let request = interceptor.call(Request::new(())).unwrap();

        let id = request.metadata().get(REQUEST_ID_METADATA).unwrap();
        assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
        assert_eq!(
            request.metadata().get(SOURCE_SERVICE_METADATA).unwrap(),
            "accounts-gateway"
        );
    }

    #[test]
    fn test_keeps_existing_request_id() {
        let mut interceptor = ClientTracingInterceptor::new();
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_METADATA, "from-http".parse().unwrap());

        let request = interceptor.call(request).unwrap();
        assert_eq!(request.metadata().get(REQUEST_ID_METADATA).unwrap(), "from-http");
        assert!(request.metadata().get(SOURCE_SERVICE_METADATA).is_none());
    }
}
