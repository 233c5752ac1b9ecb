//! Protobuf scalar ↔ domain conversions.
//!
//! Account timestamps travel as Unix seconds in `int64` fields, with `0`
//! meaning "not set" (proto3 has no presence for scalars).

use chrono::{DateTime, Utc};

/// Convert Unix seconds to DateTime<Utc>; `0`, negative and out-of-range values map to `None`
pub fn timestamp_to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
  if timestamp <= 0 {
    return None;
  }
  DateTime::from_timestamp(timestamp, 0)
}

/// Proto3 empty string → `None`
pub fn non_empty(value: String) -> Option<String> {
  if value.is_empty() { None } else { Some(value) }
}

/// Proto3 zero id → `None`
pub fn non_zero(value: i64) -> Option<i64> {
  if value == 0 { None } else { Some(value) }
}
