//! HTTP client side of the remote cache protocol.

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::debug;

use super::RemoteUri;
use crate::cache::{FAIL_STATUS, SUCCESS_STATUS};
use crate::config::{Config, DEFAULT_REMOTE_TIMEOUT};
use crate::error::{CacheError, Result};

/// A response fetched from the remote cache, replayed as-is on a hit.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    status: StatusCode,
    content_type: Option<String>,
    body: Bytes,
}

impl RemoteEntry {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl IntoResponse for RemoteEntry {
    fn into_response(self) -> Response {
        match self.content_type {
            Some(content_type) => {
                (self.status, [(CONTENT_TYPE, content_type)], self.body).into_response()
            }
            None => (self.status, self.body).into_response(),
        }
    }
}

/// Client of a remote cache server.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    remote_url: String,
}

impl RemoteClient {
    /// Creates a client with the default 5 second timeout.
    pub fn new(remote_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(remote_url, DEFAULT_REMOTE_TIMEOUT)
    }

    /// Creates a client whose calls fail after `timeout`.
    pub fn with_timeout(remote_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let remote_url = remote_url.into();
        if remote_url.trim().is_empty() {
            return Err(CacheError::InvalidRemoteUrl("empty address".to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, remote_url })
    }

    /// Creates a client from `REMOTE_URL` and `REMOTE_TIMEOUT`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote_url = config
            .remote_url
            .clone()
            .ok_or_else(|| CacheError::InvalidRemoteUrl("REMOTE_URL is not set".to_string()))?;
        Self::with_timeout(remote_url, config.remote_timeout)
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Addresses `key` on this client's server.
    pub fn uri(&self, key: impl Into<String>, client_scheme: Option<&str>) -> RemoteUri {
        RemoteUri::new(&self.remote_url, key, client_scheme)
    }

    // == Fetch ==
    /// GETs an entry. The failure status means a miss.
    pub async fn fetch(&self, uri: &RemoteUri) -> Result<Option<RemoteEntry>> {
        let response = self.http.get(uri.to_url()?).send().await?;

        let status = response.status();
        if status == FAIL_STATUS {
            debug!(key = %uri.key(), "remote cache miss");
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Ok(Some(RemoteEntry {
            status,
            content_type,
            body,
        }))
    }

    // == Store ==
    /// POSTs `body` under the key and metadata carried by `uri`.
    pub async fn store(&self, uri: &RemoteUri, body: Bytes) -> Result<()> {
        let response = self.http.post(uri.to_url()?).body(body).send().await?;
        expect_success(response.status())
    }

    // == Invalidate ==
    /// DELETEs the entry under the key carried by `uri`.
    pub async fn invalidate(&self, uri: &RemoteUri) -> Result<()> {
        let response = self.http.delete(uri.to_url()?).send().await?;
        expect_success(response.status())
    }
}

fn expect_success(status: StatusCode) -> Result<()> {
    if status == SUCCESS_STATUS {
        Ok(())
    } else {
        Err(CacheError::RemoteStatus(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_empty_address() {
        assert!(matches!(
            RemoteClient::new("  "),
            Err(CacheError::InvalidRemoteUrl(_))
        ));
    }

    #[test]
    fn test_client_from_config_requires_url() {
        let config = Config::default();
        assert!(matches!(
            RemoteClient::from_config(&config),
            Err(CacheError::InvalidRemoteUrl(_))
        ));

        let config = Config {
            remote_url: Some("cache:3000".to_string()),
            ..Config::default()
        };
        let client = RemoteClient::from_config(&config).unwrap();
        assert_eq!(client.remote_url(), "cache:3000");
    }

    #[test]
    fn test_expect_success() {
        assert!(expect_success(StatusCode::OK).is_ok());
        assert!(matches!(
            expect_success(StatusCode::BAD_REQUEST),
            Err(CacheError::RemoteStatus(StatusCode::BAD_REQUEST))
        ));
    }

    #[tokio::test]
    async fn test_remote_entry_replay() {
        let entry = RemoteEntry {
            status: StatusCode::ACCEPTED,
            content_type: Some("application/json".to_string()),
            body: Bytes::from_static(b"[]"),
        };
        let response = entry.into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let client = RemoteClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let result = client.fetch(&client.uri("GET/a", None)).await;
        assert!(matches!(result, Err(CacheError::Transport(_))));
    }
}
