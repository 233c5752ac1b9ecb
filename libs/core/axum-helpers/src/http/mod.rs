//! HTTP middleware and request metadata.
//!
//! - [`context`]: correlation id and per-request deadline
//! - [`client`]: caller IP and user agent
//! - [`cors`]: CORS layer built from configuration
//! - [`panic`]: panic-to-envelope conversion

pub mod client;
pub mod context;
pub mod cors;
pub mod panic;

pub use client::{ClientInfo, extract_ip_from_headers, extract_user_agent};
pub use context::{
    DEFAULT_REQUEST_TIMEOUT, REQUEST_ID_HEADER, RequestContext, current_request_id,
    request_context,
};
pub use cors::create_cors_layer;
pub use panic::handle_panic;
