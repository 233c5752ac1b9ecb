//! Account service client seam.
//!
//! Handlers only see [`AccountRpc`]. [`GrpcAccountRpc`] talks to the real
//! service over tonic; `crate::memory::InMemoryAccountRpc` stands in for it in
//! tests and local development.

use async_trait::async_trait;
use axum_helpers::{ErrorKind, RequestContext};
use grpc_client::{ClientTracingInterceptor, prepare_request};
use rpc::accounts as pb;
use rpc::accounts::account_service_client::AccountServiceClient;
use std::future::Future;
use tonic::codec::CompressionEncoding;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;

use crate::error::{RpcError, RpcResult};

/// Name stamped into `x-source-service` on every call.
pub const SOURCE_SERVICE: &str = "accounts-gateway";

/// Unary operations exposed by `accounts.v1.AccountService`.
///
/// Every call receives the [`RequestContext`] so implementations can forward
/// the correlation id and honour the request deadline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRpc: Send + Sync {
    async fn register(
        &self,
        ctx: &RequestContext,
        request: pb::RegisterRequest,
    ) -> RpcResult<pb::RegisterResponse>;

    async fn login(
        &self,
        ctx: &RequestContext,
        request: pb::LoginRequest,
    ) -> RpcResult<pb::LoginResponse>;

    async fn logout(
        &self,
        ctx: &RequestContext,
        request: pb::LogoutRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn refresh_token(
        &self,
        ctx: &RequestContext,
        request: pb::RefreshTokenRequest,
    ) -> RpcResult<pb::RefreshTokenResponse>;

    async fn validate_token(
        &self,
        ctx: &RequestContext,
        request: pb::ValidateTokenRequest,
    ) -> RpcResult<pb::ValidateTokenResponse>;

    async fn create_account(
        &self,
        ctx: &RequestContext,
        request: pb::CreateAccountRequest,
    ) -> RpcResult<pb::AccountResponse>;

    async fn find_account_by_id(
        &self,
        ctx: &RequestContext,
        request: pb::FindAccountByIdRequest,
    ) -> RpcResult<pb::AccountResponse>;

    async fn find_by_email(
        &self,
        ctx: &RequestContext,
        request: pb::FindByEmailRequest,
    ) -> RpcResult<pb::AccountResponse>;

    async fn find_all_users(
        &self,
        ctx: &RequestContext,
        request: pb::FindAllUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse>;

    async fn update_user_by_id(
        &self,
        ctx: &RequestContext,
        request: pb::UpdateUserByIdRequest,
    ) -> RpcResult<pb::AccountResponse>;

    async fn update_account_status(
        &self,
        ctx: &RequestContext,
        request: pb::UpdateAccountStatusRequest,
    ) -> RpcResult<pb::UpdateAccountStatusResponse>;

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        request: pb::DeleteUserRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn change_password(
        &self,
        ctx: &RequestContext,
        request: pb::ChangePasswordRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn forgot_password(
        &self,
        ctx: &RequestContext,
        request: pb::ForgotPasswordRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn reset_password(
        &self,
        ctx: &RequestContext,
        request: pb::ResetPasswordRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn verify_email(
        &self,
        ctx: &RequestContext,
        request: pb::VerifyEmailRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn resend_verification(
        &self,
        ctx: &RequestContext,
        request: pb::ResendVerificationRequest,
    ) -> RpcResult<pb::MessageResponse>;

    async fn find_by_role(
        &self,
        ctx: &RequestContext,
        request: pb::FindByRoleRequest,
    ) -> RpcResult<pb::ListAccountsResponse>;

    async fn find_by_branch(
        &self,
        ctx: &RequestContext,
        request: pb::FindByBranchRequest,
    ) -> RpcResult<pb::ListAccountsResponse>;

    async fn search_users(
        &self,
        ctx: &RequestContext,
        request: pb::SearchUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse>;
}

/// Classify a gRPC status into the edge error taxonomy.
pub fn map_status(status: &tonic::Status) -> RpcError {
    use tonic::Code;

    let kind = match status.code() {
        Code::InvalidArgument | Code::OutOfRange => ErrorKind::BadRequest,
        Code::Unauthenticated => ErrorKind::Unauthorized,
        Code::PermissionDenied => ErrorKind::Forbidden,
        Code::NotFound => ErrorKind::NotFound,
        Code::AlreadyExists | Code::FailedPrecondition | Code::Aborted => ErrorKind::Conflict,
        Code::DeadlineExceeded => return RpcError::Timeout,
        _ => ErrorKind::Internal,
    };
    RpcError::new(kind, status.message())
}

type InterceptedClient = AccountServiceClient<InterceptedService<Channel, ClientTracingInterceptor>>;

/// tonic-backed [`AccountRpc`].
///
/// The client wraps a multiplexed HTTP/2 channel and is cheap to clone, so
/// each call works on its own clone.
#[derive(Clone)]
pub struct GrpcAccountRpc {
    client: InterceptedClient,
}

impl GrpcAccountRpc {
    /// 8MB limits, zstd in both directions
    pub fn new(channel: Channel) -> Self {
        let client = AccountServiceClient::with_interceptor(
            channel,
            ClientTracingInterceptor::with_service_name(SOURCE_SERVICE),
        )
        .send_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Zstd)
        .max_decoding_message_size(8 * 1024 * 1024)
        .max_encoding_message_size(8 * 1024 * 1024);

        Self { client }
    }

    fn client(&self) -> InterceptedClient {
        self.client.clone()
    }
}

/// Run one unary call under the request deadline and classify its outcome.
async fn unary<T, F>(ctx: &RequestContext, method: &'static str, call: F) -> RpcResult<T>
where
    F: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
{
    let started = std::time::Instant::now();
    let outcome = tokio::time::timeout_at(ctx.deadline(), call).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(response)) => {
            tracing::debug!(rpc.method = method, elapsed_ms, "RPC completed");
            Ok(response.into_inner())
        }
        Ok(Err(status)) => {
            let err = map_status(&status);
            if err.is(ErrorKind::Internal) {
                tracing::warn!(
                    rpc.method = method,
                    rpc.code = ?status.code(),
                    elapsed_ms,
                    "RPC failed: {}",
                    status.message()
                );
            } else {
                tracing::debug!(rpc.method = method, rpc.code = ?status.code(), elapsed_ms, "RPC rejected");
            }
            Err(err)
        }
        Err(_) => {
            tracing::warn!(rpc.method = method, elapsed_ms, "RPC deadline exceeded");
            Err(RpcError::Timeout)
        }
    }
}

fn request<T>(ctx: &RequestContext, message: T) -> tonic::Request<T> {
    prepare_request(message, ctx.request_id(), ctx.remaining())
}

#[async_trait]
impl AccountRpc for GrpcAccountRpc {
    async fn register(
        &self,
        ctx: &RequestContext,
        req: pb::RegisterRequest,
    ) -> RpcResult<pb::RegisterResponse> {
        let mut client = self.client();
        unary(ctx, "Register", client.register(request(ctx, req))).await
    }

    async fn login(&self, ctx: &RequestContext, req: pb::LoginRequest) -> RpcResult<pb::LoginResponse> {
        let mut client = self.client();
        unary(ctx, "Login", client.login(request(ctx, req))).await
    }

    async fn logout(
        &self,
        ctx: &RequestContext,
        req: pb::LogoutRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "Logout", client.logout(request(ctx, req))).await
    }

    async fn refresh_token(
        &self,
        ctx: &RequestContext,
        req: pb::RefreshTokenRequest,
    ) -> RpcResult<pb::RefreshTokenResponse> {
        let mut client = self.client();
        unary(ctx, "RefreshToken", client.refresh_token(request(ctx, req))).await
    }

    async fn validate_token(
        &self,
        ctx: &RequestContext,
        req: pb::ValidateTokenRequest,
    ) -> RpcResult<pb::ValidateTokenResponse> {
        let mut client = self.client();
        unary(ctx, "ValidateToken", client.validate_token(request(ctx, req))).await
    }

    async fn create_account(
        &self,
        ctx: &RequestContext,
        req: pb::CreateAccountRequest,
    ) -> RpcResult<pb::AccountResponse> {
        let mut client = self.client();
        unary(ctx, "CreateAccount", client.create_account(request(ctx, req))).await
    }

    async fn find_account_by_id(
        &self,
        ctx: &RequestContext,
        req: pb::FindAccountByIdRequest,
    ) -> RpcResult<pb::AccountResponse> {
        let mut client = self.client();
        unary(ctx, "FindAccountById", client.find_account_by_id(request(ctx, req))).await
    }

    async fn find_by_email(
        &self,
        ctx: &RequestContext,
        req: pb::FindByEmailRequest,
    ) -> RpcResult<pb::AccountResponse> {
        let mut client = self.client();
        unary(ctx, "FindByEmail", client.find_by_email(request(ctx, req))).await
    }

    async fn find_all_users(
        &self,
        ctx: &RequestContext,
        req: pb::FindAllUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        let mut client = self.client();
        unary(ctx, "FindAllUsers", client.find_all_users(request(ctx, req))).await
    }

    async fn update_user_by_id(
        &self,
        ctx: &RequestContext,
        req: pb::UpdateUserByIdRequest,
    ) -> RpcResult<pb::AccountResponse> {
        let mut client = self.client();
        unary(ctx, "UpdateUserById", client.update_user_by_id(request(ctx, req))).await
    }

    async fn update_account_status(
        &self,
        ctx: &RequestContext,
        req: pb::UpdateAccountStatusRequest,
    ) -> RpcResult<pb::UpdateAccountStatusResponse> {
        let mut client = self.client();
        unary(
            ctx,
            "UpdateAccountStatus",
            client.update_account_status(request(ctx, req)),
        )
        .await
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        req: pb::DeleteUserRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "DeleteUser", client.delete_user(request(ctx, req))).await
    }

    async fn change_password(
        &self,
        ctx: &RequestContext,
        req: pb::ChangePasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "ChangePassword", client.change_password(request(ctx, req))).await
    }

    async fn forgot_password(
        &self,
        ctx: &RequestContext,
        req: pb::ForgotPasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "ForgotPassword", client.forgot_password(request(ctx, req))).await
    }

    async fn reset_password(
        &self,
        ctx: &RequestContext,
        req: pb::ResetPasswordRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "ResetPassword", client.reset_password(request(ctx, req))).await
    }

    async fn verify_email(
        &self,
        ctx: &RequestContext,
        req: pb::VerifyEmailRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(ctx, "VerifyEmail", client.verify_email(request(ctx, req))).await
    }

    async fn resend_verification(
        &self,
        ctx: &RequestContext,
        req: pb::ResendVerificationRequest,
    ) -> RpcResult<pb::MessageResponse> {
        let mut client = self.client();
        unary(
            ctx,
            "ResendVerification",
            client.resend_verification(request(ctx, req)),
        )
        .await
    }

    async fn find_by_role(
        &self,
        ctx: &RequestContext,
        req: pb::FindByRoleRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        let mut client = self.client();
        unary(ctx, "FindByRole", client.find_by_role(request(ctx, req))).await
    }

    async fn find_by_branch(
        &self,
        ctx: &RequestContext,
        req: pb::FindByBranchRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        let mut client = self.client();
        unary(ctx, "FindByBranch", client.find_by_branch(request(ctx, req))).await
    }

    async fn search_users(
        &self,
        ctx: &RequestContext,
        req: pb::SearchUsersRequest,
    ) -> RpcResult<pb::ListAccountsResponse> {
        let mut client = self.client();
        unary(ctx, "SearchUsers", client.search_users(request(ctx, req))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tonic::{Code, Status};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Code::InvalidArgument, ErrorKind::BadRequest),
            (Code::OutOfRange, ErrorKind::BadRequest),
            (Code::Unauthenticated, ErrorKind::Unauthorized),
            (Code::PermissionDenied, ErrorKind::Forbidden),
            (Code::NotFound, ErrorKind::NotFound),
            (Code::AlreadyExists, ErrorKind::Conflict),
            (Code::FailedPrecondition, ErrorKind::Conflict),
            (Code::Aborted, ErrorKind::Conflict),
            (Code::Unavailable, ErrorKind::Internal),
            (Code::Unknown, ErrorKind::Internal),
            (Code::Internal, ErrorKind::Internal),
        ];
        for (code, kind) in cases {
            assert_eq!(map_status(&Status::new(code, "x")).kind(), kind, "{code:?}");
        }
    }

    #[test]
    fn test_deadline_exceeded_is_timeout() {
        assert_eq!(
            map_status(&Status::deadline_exceeded("slow")),
            RpcError::Timeout
        );
    }

    #[test]
    fn test_status_message_is_kept() {
        let err = map_status(&Status::failed_precondition("suspended -> pending"));
        assert_eq!(err.message(), "suspended -> pending");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unary_times_out_at_deadline() {
        let ctx = RequestContext::new("req-1", Duration::from_millis(100));
        let call = std::future::pending::<Result<tonic::Response<()>, Status>>();
        let result = unary(&ctx, "Login", call).await;
        assert_eq!(result, Err(RpcError::Timeout));
    }

    #[tokio::test]
    async fn test_unary_maps_status() {
        let ctx = RequestContext::new("req-2", Duration::from_secs(5));
        let result = unary(&ctx, "FindAccountById", async {
            Err::<tonic::Response<()>, _>(Status::not_found("account 9 not found"))
        })
        .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_grpc_client_builds_on_lazy_channel() {
        let channel = grpc_client::create_channel_lazy(
            "http://127.0.0.1:50051",
            grpc_client::ChannelConfig::default(),
        )
        .unwrap();
        let _rpc = GrpcAccountRpc::new(channel);
    }
}
