//! respcache - HTTP response caching for axum/tower services
//!
//! Caches whole responses (status, content type, body) under a request key
//! with TTL expiration, either in process or on a shared cache server.

pub mod adapters;
pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod remote;
pub mod rules;
pub mod tasks;

pub use adapters::{cache_middleware, CacheLayer, CacheState, CachedService};
pub use api::{create_router, AppState};
pub use cache::{MemoryStore, Store};
pub use config::Config;
pub use engine::CacheEngine;
pub use error::CacheError;
pub use remote::RemoteClient;
pub use rules::{no_cache, NoCache, RuleSet};
