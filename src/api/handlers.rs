//! API Handlers
//!
//! The remote cache protocol endpoint plus the health and statistics
//! endpoints of a cache server.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header::CACHE_CONTROL, Method},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::{
    ttl_from_secs, MemoryStore, Store, FAIL_STATUS, MAX_BODY_SIZE, MINIMUM_ALLOWED_DURATION,
    SUCCESS_STATUS,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, RemoteParams, StatsResponse};
use crate::rules::parse_max_age;

/// Application state shared across all handlers.
///
/// Holds the store every remote client of this server reads and writes.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Creates a new AppState around the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a memory store with its GC sweep from configuration.
    ///
    /// Must be called inside a tokio runtime for the sweep to start.
    pub fn from_config(config: &Config) -> Self {
        Self::new(MemoryStore::with_gc(config.gc_interval))
    }
}

// == Remote Protocol ==
/// Serves one remote protocol call against `store`.
///
/// - `GET` replays the entry under `cache_key`, or answers the failure status
/// - `POST` stores the body under `cache_key`
/// - `DELETE` removes the entry under `cache_key`
///
/// Any other verb, a missing key, or a POST body that is empty or larger than
/// [`MAX_BODY_SIZE`] is a failure. Failures carry no body.
pub async fn serve_remote(store: &dyn Store, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let params = Query::<RemoteParams>::try_from_uri(&parts.uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    let key = params.key().ok_or(CacheError::MissingKey)?;

    match parts.method {
        Method::GET => match store.get(key) {
            Some(entry) => Ok(entry.to_response()),
            None => {
                debug!(key = %key, "remote get: miss");
                Ok(FAIL_STATUS.into_response())
            }
        },
        Method::POST => {
            let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
                .await
                .map_err(|err| CacheError::Body(err.to_string()))?;
            if body.is_empty() {
                return Err(CacheError::EmptyBody);
            }

            // Explicit parameter, then the request's own max-age, then the floor
            let ttl = params
                .duration_secs()
                .or_else(|| {
                    parts
                        .headers
                        .get(CACHE_CONTROL)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_max_age)
                        .and_then(|secs| i64::try_from(secs).ok())
                        .filter(|secs| *secs > 0)
                })
                .map(ttl_from_secs)
                .unwrap_or(MINIMUM_ALLOWED_DURATION);

            debug!(key = %key, ttl = ?ttl, "remote set");
            store.set(key, params.status_code(), params.content_type(), body, ttl);
            Ok(SUCCESS_STATUS.into_response())
        }
        Method::DELETE => {
            debug!(key = %key, "remote remove");
            store.remove(key);
            Ok(SUCCESS_STATUS.into_response())
        }
        method => Err(CacheError::UnsupportedMethod(method)),
    }
}

/// Handler for the remote protocol at `/`
pub async fn remote_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    serve_remote(state.store.as_ref(), request).await
}

/// Handler for GET /stats
///
/// Returns current store statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.store.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
