//! Engine Module
//!
//! Orchestrates one cached request: claim check, lookup, origin execution
//! with response recording, post-validation and detached persistence.
//!
//! The same [`CacheEngine`] backs a local store or a remote cache server, and
//! is shared by every adapter built from it.

mod key;
mod recorder;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::adapters::{CacheLayer, CachedService};
use crate::api;
use crate::cache::{MemoryStore, Store, FAIL_STATUS, MAX_BODY_SIZE, MINIMUM_ALLOWED_DURATION};
use crate::remote::RemoteClient;
use crate::rules::{parse_max_age, RuleSet, NO_CACHE_HEADER};

pub use key::{local_key, remote_key};
pub use recorder::{record_response, RecordedResponse};

// == Backend ==
enum Backend {
    Local(Arc<dyn Store>),
    Remote(RemoteClient),
}

struct EngineInner {
    backend: Backend,
    rules: RuleSet,
}

// == Cache Engine ==
/// Response cache in front of an origin handler.
///
/// Cheap to clone; clones share the backend and the rule set.
#[derive(Clone)]
pub struct CacheEngine {
    inner: Arc<EngineInner>,
}

impl CacheEngine {
    // == Constructors ==
    /// Creates an engine over a local store.
    pub fn new(store: Arc<dyn Store>, rules: RuleSet) -> Self {
        Self::with_backend(Backend::Local(store), rules)
    }

    /// Creates an engine over a fresh [`MemoryStore`] with the default rules.
    ///
    /// The GC sweep only starts when `gc_interval` is above the TTL floor and
    /// a tokio runtime is running.
    pub fn memory(gc_interval: Duration) -> Self {
        Self::new(MemoryStore::with_gc(gc_interval), RuleSet::default())
    }

    /// Creates an engine that reads and writes a remote cache server.
    pub fn remote(client: RemoteClient, rules: RuleSet) -> Self {
        Self::with_backend(Backend::Remote(client), rules)
    }

    fn with_backend(backend: Backend, rules: RuleSet) -> Self {
        Self {
            inner: Arc::new(EngineInner { backend, rules }),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.inner.rules
    }

    /// The local store, `None` for a remote engine.
    pub fn store(&self) -> Option<&Arc<dyn Store>> {
        match &self.inner.backend {
            Backend::Local(store) => Some(store),
            Backend::Remote(_) => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.inner.backend, Backend::Remote(_))
    }

    // == Handle ==
    /// Serves `request` from the cache or through `origin`.
    ///
    /// `ttl` above the floor wins; otherwise the `max-age` of the origin's
    /// response, then of the request, is used and the store floors the rest.
    /// Origin errors are returned untouched and never cached.
    ///
    /// On a miss the origin's body streams to the caller as it is produced;
    /// the entry is stored once the caller has read all of it.
    pub async fn handle<F, Fut, E>(
        &self,
        request: Request,
        ttl: Duration,
        origin: F,
    ) -> Result<Response, E>
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Result<Response, E>>,
    {
        let (parts, body) = request.into_parts();
        if !self.inner.rules.claim(&parts) {
            debug!(method = %parts.method, uri = %parts.uri, "request not claimed, bypassing cache");
            return origin(Request::from_parts(parts, body)).await;
        }

        let slot = self.slot(&parts.method, &parts.uri, &parts.headers);
        if let Some(cached) = self.lookup(&slot).await {
            debug!(key = %slot.key, "cache hit");
            return Ok(cached);
        }
        debug!(key = %slot.key, "cache miss");

        let request_max_age = header_max_age(&parts.headers);
        let response = origin(Request::from_parts(parts, body)).await?;

        if response.headers().contains_key(NO_CACHE_HEADER) {
            debug!(key = %slot.key, "response marked no-cache, not stored");
            return Ok(response);
        }

        let engine = self.clone();
        Ok(record_response(response, MAX_BODY_SIZE, move |recorded| {
            engine.complete(slot, recorded, ttl, request_max_age);
        }))
    }

    // == Complete ==
    /// Post-validates a fully streamed response and persists it.
    fn complete(&self, slot: Slot, recorded: RecordedResponse, ttl: Duration, request_max_age: Option<u64>) {
        if !self.inner.rules.valid(&recorded) {
            debug!(key = %slot.key, "response rejected by valid rules, not stored");
            return;
        }
        if recorded.body().is_empty() {
            debug!(key = %slot.key, "empty response body, not stored");
            return;
        }

        let ttl = effective_ttl(ttl, &recorded, request_max_age);
        self.persist(slot, recorded, ttl);
    }

    fn slot(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Slot {
        match &self.inner.backend {
            Backend::Local(_) => Slot {
                key: local_key(method, uri),
                scheme: None,
            },
            Backend::Remote(_) => Slot {
                key: remote_key(method, uri, headers),
                scheme: uri.scheme_str().map(str::to_owned),
            },
        }
    }

    async fn lookup(&self, slot: &Slot) -> Option<Response> {
        match &self.inner.backend {
            Backend::Local(store) => store.get(&slot.key).map(|entry| entry.to_response()),
            Backend::Remote(client) => {
                let uri = client.uri(slot.key.as_str(), slot.scheme.as_deref());
                match client.fetch(&uri).await {
                    Ok(entry) => entry.map(IntoResponse::into_response),
                    Err(err) => {
                        warn!(key = %slot.key, error = %err, "remote cache lookup failed, treating as miss");
                        None
                    }
                }
            }
        }
    }

    // == Persist ==
    /// Stores the recording off the request path. Failures are only logged.
    fn persist(&self, slot: Slot, recorded: RecordedResponse, ttl: Duration) {
        match &self.inner.backend {
            Backend::Local(store) => {
                let store = Arc::clone(store);
                let write = move || {
                    store.set(
                        &slot.key,
                        i32::from(recorded.status().as_u16()),
                        recorded.content_type(),
                        recorded.body().clone(),
                        ttl,
                    );
                    debug!(key = %slot.key, ttl = ?ttl, "response stored");
                };

                match Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(async move { write() });
                    }
                    Err(_) => write(),
                }
            }
            Backend::Remote(client) => {
                let Ok(runtime) = Handle::try_current() else {
                    warn!(key = %slot.key, "no tokio runtime, remote store skipped");
                    return;
                };

                let mut uri = client
                    .uri(slot.key.as_str(), slot.scheme.as_deref())
                    .with_status_code(recorded.status())
                    .with_content_type(recorded.content_type());
                if !ttl.is_zero() {
                    uri = uri.with_ttl_secs(wire_ttl_secs(ttl));
                }

                let client = client.clone();
                let body = recorded.body().clone();
                runtime.spawn(async move {
                    match client.store(&uri, body).await {
                        Ok(()) => debug!(key = %uri.key(), "response stored remotely"),
                        Err(err) => warn!(key = %uri.key(), error = %err, "remote cache store failed"),
                    }
                });
            }
        }
    }

    // == Adapters ==
    /// Wraps a tower service so its responses go through this engine.
    pub fn wrap<S>(&self, service: S, ttl: Duration) -> CachedService<S> {
        CachedService::new(service, self.clone(), ttl)
    }

    /// A tower layer applying this engine to every wrapped service.
    pub fn layer(&self, ttl: Duration) -> CacheLayer {
        CacheLayer::new(self.clone(), ttl)
    }

    // == Invalidate ==
    /// Removes the entry `request` would be served from. Rules are not consulted.
    pub async fn invalidate<B>(&self, request: &axum::http::Request<B>) {
        let slot = self.slot(request.method(), request.uri(), request.headers());

        match &self.inner.backend {
            Backend::Local(store) => {
                store.remove(&slot.key);
                debug!(key = %slot.key, "entry invalidated");
            }
            Backend::Remote(client) => {
                let uri = client.uri(slot.key.as_str(), slot.scheme.as_deref());
                if let Err(err) = client.invalidate(&uri).await {
                    warn!(key = %slot.key, error = %err, "remote invalidation failed");
                }
            }
        }
    }

    // == Clear ==
    /// Empties the local store. The remote protocol has no verb for this, so a
    /// remote engine only logs.
    pub fn clear(&self) {
        match &self.inner.backend {
            Backend::Local(store) => {
                store.clear();
                debug!("cache cleared");
            }
            Backend::Remote(client) => {
                warn!(remote = %client.remote_url(), "clear is not supported on a remote cache");
            }
        }
    }

    // == Serve Remote ==
    /// Answers a remote protocol call against this engine's local store.
    ///
    /// A remote engine has no store to expose and answers the failure status.
    pub async fn serve_remote(&self, request: Request) -> Response {
        match &self.inner.backend {
            Backend::Local(store) => match api::serve_remote(store.as_ref(), request).await {
                Ok(response) => response,
                Err(err) => {
                    debug!(error = %err, "remote protocol call rejected");
                    err.into_response()
                }
            },
            Backend::Remote(_) => FAIL_STATUS.into_response(),
        }
    }

    // == Close ==
    /// Releases the backend's background resources.
    pub fn close(&self) {
        if let Backend::Local(store) = &self.inner.backend {
            store.close();
        }
    }
}

impl fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.inner.backend {
            Backend::Local(_) => "local",
            Backend::Remote(_) => "remote",
        };
        f.debug_struct("CacheEngine")
            .field("backend", &backend)
            .field("rules", &self.inner.rules)
            .finish()
    }
}

/// Where one request lives in the backend.
struct Slot {
    key: String,
    scheme: Option<String>,
}

fn header_max_age(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_max_age)
}

fn effective_ttl(configured: Duration, recorded: &RecordedResponse, request_max_age: Option<u64>) -> Duration {
    if configured > MINIMUM_ALLOWED_DURATION {
        return configured;
    }
    recorded
        .max_age()
        .or(request_max_age)
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

/// Whole seconds sent to a remote cache, rounded up and kept within what the
/// server parses.
fn wire_ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.min(i64::MAX as u64)
}
