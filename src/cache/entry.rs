//! Cache Entry Module
//!
//! Defines the immutable snapshot of one cached response.

use std::time::Duration;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::time::Instant;

use crate::cache::{normalize_content_type, normalize_status, normalize_ttl, DEFAULT_CONTENT_TYPE};

/// Lifetime given to entries whose TTL reaches past what the clock can hold.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

// == Cache Entry ==
/// One cached response: status, content type, body and expiry.
///
/// Entries are never mutated after creation; a `set` on the same key replaces
/// the whole entry.
#[derive(Debug, Clone)]
pub struct Entry {
    status_code: StatusCode,
    content_type: String,
    body: Bytes,
    expires_at: Instant,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry, normalizing every field.
    ///
    /// # Arguments
    /// * `status_code` - Recorded status; `<= 0` or invalid becomes 200
    /// * `content_type` - Recorded content type; empty becomes the text default
    /// * `body` - The full response body
    /// * `ttl` - Requested TTL; at or below the floor becomes twice the floor
    pub fn new(status_code: i32, content_type: &str, body: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(normalize_ttl(ttl))
            .unwrap_or_else(|| now + FAR_FUTURE);

        Self {
            status_code: normalize_status(status_code),
            content_type: normalize_content_type(content_type),
            body,
            expires_at,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    // == Is Expired ==
    /// Checks whether a read at `now` must treat the entry as gone.
    ///
    /// A read exactly at `expires_at` is still a hit; the GC sweep is the one
    /// that deletes entries at the boundary.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Checks whether the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    // == Replay ==
    /// Builds the response served on a hit: stored status, `Content-Type` and
    /// body, nothing else.
    pub fn to_response(&self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        (self.status_code, [(CONTENT_TYPE, content_type)], self.body.clone()).into_response()
    }
}
