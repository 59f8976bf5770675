//! Addressing of remote cache calls.

use axum::http::StatusCode;
use reqwest::Url;

use crate::error::{CacheError, Result};
use crate::models::{
    QUERY_CACHE_CONTENT_TYPE, QUERY_CACHE_DURATION, QUERY_CACHE_KEY, QUERY_CACHE_STATUS_CODE,
};

/// Completes a configured remote address: adds the trailing `/` and, when no
/// scheme is given, picks one.
///
/// An address naming port 443 or `https` gets `https`; otherwise the scheme
/// of the client request is reused, falling back to `http`.
pub fn normalize_remote_url(remote_url: &str, client_scheme: Option<&str>) -> String {
    let mut url = remote_url.trim().to_string();
    if !url.ends_with('/') {
        url.push('/');
    }

    if !url.contains("://") {
        let scheme = if url.contains(":443") || url.contains(":https") {
            "https"
        } else {
            client_scheme.filter(|scheme| !scheme.is_empty()).unwrap_or("http")
        };
        url = format!("{scheme}://{url}");
    }
    url
}

/// One remote cache call: the server address, the entry key and, for stores,
/// the metadata to persist with the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUri {
    base: String,
    key: String,
    ttl_secs: Option<u64>,
    status_code: Option<StatusCode>,
    content_type: Option<String>,
}

impl RemoteUri {
    pub fn new(remote_url: &str, key: impl Into<String>, client_scheme: Option<&str>) -> Self {
        Self {
            base: normalize_remote_url(remote_url, client_scheme),
            key: key.into(),
            ttl_secs: None,
            status_code: None,
            content_type: None,
        }
    }

    pub fn with_ttl_secs(mut self, secs: u64) -> Self {
        self.ttl_secs = Some(secs);
        self
    }

    pub fn with_status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into()).filter(|value| !value.is_empty());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Renders the call as a URL with every parameter escaped.
    pub fn to_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base)
            .map_err(|err| CacheError::InvalidRemoteUrl(format!("{}: {}", self.base, err)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair(QUERY_CACHE_KEY, &self.key);
            if let Some(secs) = self.ttl_secs {
                query.append_pair(QUERY_CACHE_DURATION, &secs.to_string());
            }
            if let Some(status_code) = self.status_code {
                query.append_pair(QUERY_CACHE_STATUS_CODE, status_code.as_str());
            }
            if let Some(content_type) = &self.content_type {
                query.append_pair(QUERY_CACHE_CONTENT_TYPE, content_type);
            }
        }
        Ok(url)
    }
}
