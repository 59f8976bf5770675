//! Cache Module
//!
//! Provides the in-memory response store with TTL expiration and a background
//! GC sweep, plus the normalization rules every stored entry goes through.

mod entry;
mod stats;
mod store;


use std::time::Duration;

use axum::http::StatusCode;

// Re-export public types
pub use entry::Entry;
pub use stats::CacheStats;
pub use store::{MemoryStore, Store};

// == Public Constants ==
/// Floor for any TTL or GC interval.
///
/// A TTL at or below this value is replaced by twice the floor, and a GC
/// interval at or below it never starts a sweep.
pub const MINIMUM_ALLOWED_DURATION: Duration = Duration::from_secs(2);

/// Status code stored when the recorded one is missing or invalid
pub const DEFAULT_STATUS: StatusCode = StatusCode::OK;

/// Content type stored when the recorded one is empty
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Largest body the cache records or the remote protocol accepts
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Status answered by the remote protocol on success
pub const SUCCESS_STATUS: StatusCode = StatusCode::OK;

/// Status answered by the remote protocol on any failure
pub const FAIL_STATUS: StatusCode = StatusCode::BAD_REQUEST;

// == Normalization ==
/// Returns the TTL an entry is actually stored with.
pub fn normalize_ttl(ttl: Duration) -> Duration {
    if ttl > MINIMUM_ALLOWED_DURATION {
        ttl
    } else {
        MINIMUM_ALLOWED_DURATION * 2
    }
}

/// Converts a signed number of seconds into a TTL, clamping negatives to zero.
///
/// Wire values and header values are signed; zero and negatives both end up
/// floored by [`normalize_ttl`].
pub fn ttl_from_secs(secs: i64) -> Duration {
    Duration::from_secs(secs.max(0) as u64)
}

/// Returns the status code an entry is actually stored with.
pub fn normalize_status(status_code: i32) -> StatusCode {
    if status_code <= 0 {
        return DEFAULT_STATUS;
    }
    u16::try_from(status_code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(DEFAULT_STATUS)
}

/// Returns the content type an entry is actually stored with.
pub fn normalize_content_type(content_type: &str) -> String {
    if content_type.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        content_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ttl_above_floor_is_kept() {
        assert_eq!(normalize_ttl(Duration::from_secs(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_normalize_ttl_at_floor_is_doubled() {
        assert_eq!(normalize_ttl(MINIMUM_ALLOWED_DURATION), Duration::from_secs(4));
        assert_eq!(normalize_ttl(Duration::ZERO), Duration::from_secs(4));
    }

    #[test]
    fn test_ttl_from_negative_secs() {
        assert_eq!(ttl_from_secs(-30), Duration::ZERO);
        assert_eq!(ttl_from_secs(12), Duration::from_secs(12));
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status(0), StatusCode::OK);
        assert_eq!(normalize_status(-1), StatusCode::OK);
        assert_eq!(normalize_status(404), StatusCode::NOT_FOUND);
        assert_eq!(normalize_status(70_000), StatusCode::OK);
        assert_eq!(normalize_status(42), StatusCode::OK);
    }

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(normalize_content_type(""), DEFAULT_CONTENT_TYPE);
        assert_eq!(normalize_content_type("text/html"), "text/html");
    }
}
