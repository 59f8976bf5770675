//! Tower layer and service wrapping an inner service with a [`CacheEngine`].

use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::engine::CacheEngine;

/// Applies a [`CacheEngine`] to every service it wraps.
///
/// ```ignore
/// let engine = CacheEngine::memory(Duration::from_secs(1800));
/// let app = Router::new()
///     .route("/", get(index))
///     .layer(engine.layer(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone)]
pub struct CacheLayer {
    engine: CacheEngine,
    ttl: Duration,
}

impl CacheLayer {
    pub fn new(engine: CacheEngine, ttl: Duration) -> Self {
        Self { engine, ttl }
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = CachedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CachedService::new(inner, self.engine.clone(), self.ttl)
    }
}

/// A service whose responses are served from and stored into a cache.
#[derive(Debug, Clone)]
pub struct CachedService<S> {
    inner: S,
    engine: CacheEngine,
    ttl: Duration,
}

impl<S> CachedService<S> {
    pub fn new(inner: S, engine: CacheEngine, ttl: Duration) -> Self {
        Self { inner, engine, ttl }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S> Service<Request> for CachedService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Keep the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let engine = self.engine.clone();
        let ttl = self.ttl;

        Box::pin(async move {
            engine
                .handle(request, ttl, move |request| inner.call(request))
                .await
        })
    }
}
