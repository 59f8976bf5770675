//! Request DTOs for the remote cache protocol
//!
//! Every remote call addresses one entry through query parameters; POST
//! carries the body to store.

use serde::Deserialize;

/// Query parameter naming the entry
pub const QUERY_CACHE_KEY: &str = "cache_key";
/// Query parameter carrying the TTL in seconds (POST)
pub const QUERY_CACHE_DURATION: &str = "cache_duration";
/// Query parameter carrying the status code to store (POST)
pub const QUERY_CACHE_STATUS_CODE: &str = "cache_status_code";
/// Query parameter carrying the content type to store (POST)
pub const QUERY_CACHE_CONTENT_TYPE: &str = "cache_content_type";

/// Query parameters of a remote protocol call.
///
/// Values stay raw strings: unparsable numbers fall back to defaults instead
/// of rejecting the call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteParams {
    /// The cache key
    #[serde(default)]
    pub cache_key: Option<String>,
    /// TTL in seconds
    #[serde(default)]
    pub cache_duration: Option<String>,
    /// Status code to replay
    #[serde(default)]
    pub cache_status_code: Option<String>,
    /// Content type to replay
    #[serde(default)]
    pub cache_content_type: Option<String>,
}

impl RemoteParams {
    /// The cache key, `None` when missing or empty.
    pub fn key(&self) -> Option<&str> {
        self.cache_key.as_deref().filter(|key| !key.is_empty())
    }

    /// The requested TTL in seconds, `None` when missing, unparsable or not positive.
    pub fn duration_secs(&self) -> Option<i64> {
        self.cache_duration
            .as_deref()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
    }

    /// The status code to store; `0` lets the store pick its default.
    pub fn status_code(&self) -> i32 {
        self.cache_status_code
            .as_deref()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// The content type to store; empty lets the store pick its default.
    pub fn content_type(&self) -> &str {
        self.cache_content_type.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    fn params(uri: &str) -> RemoteParams {
        let uri: Uri = uri.parse().unwrap();
        Query::<RemoteParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_params_from_query() {
        let p = params("/?cache_key=GET%2Fa&cache_duration=30&cache_status_code=201&cache_content_type=text%2Fhtml");

        assert_eq!(p.key(), Some("GET/a"));
        assert_eq!(p.duration_secs(), Some(30));
        assert_eq!(p.status_code(), 201);
        assert_eq!(p.content_type(), "text/html");
    }

    #[test]
    fn test_params_missing_values() {
        let p = params("/");

        assert_eq!(p.key(), None);
        assert_eq!(p.duration_secs(), None);
        assert_eq!(p.status_code(), 0);
        assert_eq!(p.content_type(), "");
    }

    #[test]
    fn test_params_empty_key_is_missing() {
        assert_eq!(params("/?cache_key=").key(), None);
    }

    #[test]
    fn test_params_invalid_numbers_fall_back() {
        let p = params("/?cache_key=k&cache_duration=soon&cache_status_code=ok");

        assert_eq!(p.duration_secs(), None);
        assert_eq!(p.status_code(), 0);
    }

    #[test]
    fn test_params_non_positive_duration_is_missing() {
        assert_eq!(params("/?cache_key=k&cache_duration=0").duration_secs(), None);
        assert_eq!(params("/?cache_key=k&cache_duration=-5").duration_secs(), None);
    }
}
