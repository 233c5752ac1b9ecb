//! Request extractors whose rejections render as the standard envelope.

pub mod json_body;
pub mod path_segment;
pub mod positive_id;

pub use json_body::JsonBody;
pub use path_segment::PathSegment;
pub use positive_id::PositiveId;
