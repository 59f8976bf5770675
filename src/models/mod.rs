//! Request and Response models for the cache server
//!
//! This module defines the query parameters of the remote protocol and the
//! JSON bodies of the operational endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    RemoteParams, QUERY_CACHE_CONTENT_TYPE, QUERY_CACHE_DURATION, QUERY_CACHE_KEY,
    QUERY_CACHE_STATUS_CODE,
};
pub use responses::{HealthResponse, StatsResponse};
