//! Error types for the response cache
//!
//! Provides unified error handling using thiserror. None of these errors ever
//! reaches the client of a cached route: the engine degrades every one of them
//! to "compute fresh". Only the remote protocol endpoint turns them into a
//! response, and then only as the bare failure status.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::FAIL_STATUS;

// == Cache Error Enum ==
/// Unified error type for the response cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The remote cache could not be reached or timed out
    #[error("Remote cache transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote cache answered with an unexpected status
    #[error("Remote cache answered {0}")]
    RemoteStatus(StatusCode),

    /// The configured remote cache address is not a usable URL
    #[error("Invalid remote cache url: {0}")]
    InvalidRemoteUrl(String),

    /// Remote protocol request without a `cache_key` parameter
    #[error("Missing cache key")]
    MissingKey,

    /// Remote protocol POST without a body
    #[error("Empty body")]
    EmptyBody,

    /// Remote protocol request with a verb other than GET, POST or DELETE
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(Method),

    /// A response or request body could not be read
    #[error("Body error: {0}")]
    Body(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        FAIL_STATUS.into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the response cache.
pub type Result<T> = std::result::Result<T, CacheError>;
