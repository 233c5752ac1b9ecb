//! Protobuf messages and tonic client for `accounts.v1.AccountService`.
//!
//! Sources live in `proto/`; `src/generated/` is regenerated from them.

mod generated;

pub use generated::accounts;
