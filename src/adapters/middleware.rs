//! Axum middleware function running requests through a [`CacheEngine`].

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::engine::CacheEngine;

/// State of [`cache_middleware`]: the shared engine and the TTL for the
/// routes it is attached to.
#[derive(Debug, Clone)]
pub struct CacheState {
    pub engine: CacheEngine,
    pub ttl: Duration,
}

impl CacheState {
    pub fn new(engine: CacheEngine, ttl: Duration) -> Self {
        Self { engine, ttl }
    }
}

/// Middleware serving cached responses in front of the rest of the stack.
///
/// ```ignore
/// let state = CacheState::new(engine, Duration::from_secs(10));
/// let app = Router::new()
///     .route("/", get(index))
///     .layer(axum::middleware::from_fn_with_state(state, cache_middleware));
/// ```
pub async fn cache_middleware(
    State(cache): State<CacheState>,
    request: Request,
    next: Next,
) -> Response {
    let result = cache
        .engine
        .handle(request, cache.ttl, move |request| async move {
            Ok::<_, Infallible>(next.run(request).await)
        })
        .await;

    match result {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
