//! Adapters Module
//!
//! Hooks a [`crate::engine::CacheEngine`] into an axum/tower stack, either as
//! a tower layer around any service or as an axum middleware function. All
//! adapters built from one engine share its store and rules.

mod middleware;
mod service;

pub use middleware::{cache_middleware, CacheState};
pub use service::{CacheLayer, CachedService};
