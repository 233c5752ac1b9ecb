//! # Accounts Domain
//!
//! HTTP edge for the account service. Every operation is a thin adapter:
//! bind and validate the request, call the account service over gRPC under
//! the request deadline, translate the outcome.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ routes      public + protected groups   │
//! ├─────────────────────────────────────────┤
//! │ auth        bearer token → Principal    │
//! ├─────────────────────────────────────────┤
//! │ handlers    one per operation           │
//! │ binder      JSON body + validation      │
//! │ extract     principal, pagination,      │
//! │             search query                │
//! ├─────────────────────────────────────────┤
//! │ validation  named rule registry         │
//! ├─────────────────────────────────────────┤
//! │ rpc         AccountRpc trait            │
//! │   GrpcAccountRpc   (tonic)              │
//! │   InMemoryAccountRpc (tests, local dev) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use domain_accounts::{AccountGateway, GrpcAccountRpc, router};
//!
//! let channel = grpc_client::create_channel_lazy(addr, ChannelConfig::default())?;
//! let gateway = AccountGateway::new(Arc::new(GrpcAccountRpc::new(channel)));
//! let app = router(gateway);
//! ```

pub mod auth;
pub mod binder;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod routes;
pub mod rpc;
pub mod validation;

pub use binder::ValidatedBody;
pub use error::{RpcError, RpcResult};
pub use extract::{Pagination, SearchQuery};
pub use gateway::AccountGateway;
pub use memory::InMemoryAccountRpc;
pub use models::{Account, AccountPage, AccountStatus, Principal, Role};
pub use routes::{router, router_with_layer};
pub use rpc::{AccountRpc, GrpcAccountRpc};
pub use validation::{Rule, ValidatorRegistry};
