//! Cache Store Module
//!
//! The `Store` abstraction the engine and the remote endpoint talk to, and the
//! in-memory implementation with lazy expiration and a background GC sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheStats, Entry, MINIMUM_ALLOWED_DURATION};
use crate::tasks::spawn_sweep_task;

// == Store Trait ==
/// Concurrent key to entry table.
///
/// Inputs are sanitized rather than rejected, so no operation can fail.
pub trait Store: Send + Sync + 'static {
    /// Adds or fully replaces the entry stored under `key`.
    fn set(&self, key: &str, status_code: i32, content_type: &str, body: Bytes, ttl: Duration);

    /// Returns the live entry stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Arc<Entry>>;

    /// Removes the entry stored under `key`. Absent keys are a no-op.
    fn remove(&self, key: &str);

    /// Removes every entry.
    fn clear(&self);

    /// Releases background resources held by the store.
    fn close(&self) {}

    /// Returns a snapshot of the store's counters.
    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

// == Memory Store ==
/// In-memory store guarded by one reader/writer lock over the whole map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key to entry mapping
    entries: RwLock<HashMap<String, Arc<Entry>>>,
    /// Performance statistics
    stats: StatsCounters,
    /// Set once the first GC start was accepted
    gc_started: AtomicBool,
    /// Handle of the running sweep, taken on close
    gc_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store without a GC sweep.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a shared store and starts its GC sweep at `gc_interval`.
    ///
    /// An interval at or below [`MINIMUM_ALLOWED_DURATION`] leaves the sweep
    /// disabled; expired entries are then only dropped lazily on `get`.
    pub fn with_gc(gc_interval: Duration) -> Arc<Self> {
        let store = Arc::new(Self::new());
        store.start_gc(gc_interval);
        store
    }

    // == Start GC ==
    /// Starts the background sweep. Returns whether a sweep was started.
    ///
    /// The sweep starts at most once per store. It is refused when the
    /// interval is at or below the floor or when no tokio runtime is running.
    pub fn start_gc(self: &Arc<Self>, interval: Duration) -> bool {
        if interval <= MINIMUM_ALLOWED_DURATION {
            debug!(
                "GC interval {:?} is at or below {:?}, sweep disabled",
                interval, MINIMUM_ALLOWED_DURATION
            );
            return false;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime available, GC sweep not started");
                return false;
            }
        };

        if self.gc_started.swap(true, Ordering::AcqRel) {
            return false;
        }

        let handle = spawn_sweep_task(&runtime, Arc::downgrade(self), interval);
        *self.gc_handle.lock() = Some(handle);
        info!("GC sweep started with interval {:?}", interval);
        true
    }

    /// Returns true while a GC sweep task is running for this store.
    pub fn gc_running(&self) -> bool {
        self.gc_handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Purge Expired ==
    /// Removes every entry whose expiry is at or before now.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at() > now);
        let removed = before - entries.len();
        drop(entries);

        self.stats.record_expirations(removed);
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn set(&self, key: &str, status_code: i32, content_type: &str, body: Bytes, ttl: Duration) {
        let entry = Arc::new(Entry::new(status_code, content_type, body, ttl));
        self.entries.write().insert(key.to_string(), entry);
    }

    fn get(&self, key: &str) -> Option<Arc<Entry>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return None;
                }
                Some(entry) if !entry.is_expired_at(now) => {
                    self.stats.record_hit();
                    return Some(Arc::clone(entry));
                }
                Some(_) => {}
            }
        }

        // The GC may run late or not at all; drop the stale entry here. A
        // concurrent set may already have replaced it, so check again.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            entries.remove(key);
            self.stats.record_expirations(1);
        }
        drop(entries);

        self.stats.record_miss();
        None
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn close(&self) {
        if let Some(handle) = self.gc_handle.lock().take() {
            handle.abort();
            info!("GC sweep stopped");
        }
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.gc_handle.get_mut().take() {
            handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn body(text: &'static str) -> Bytes {
        Bytes::from_static(text.as_bytes())
    }

    #[test]
    fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_set_and_get() {
        let store = MemoryStore::new();

        store.set("/a", 200, "text/plain", body("hello"), Duration::from_secs(5));
        let entry = store.get("/a").expect("entry should be cached");

        assert_eq!(entry.status_code(), StatusCode::OK);
        assert_eq!(entry.content_type(), "text/plain");
        assert_eq!(entry.body().as_ref(), b"hello");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = MemoryStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_remove() {
        let store = MemoryStore::new();

        store.set("key1", 200, "", body("value1"), Duration::from_secs(60));
        store.remove("key1");

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_remove_nonexistent_is_noop() {
        let store = MemoryStore::new();
        store.set("key1", 200, "", body("value1"), Duration::from_secs(60));

        store.remove("nonexistent");

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_clear_twice() {
        let store = MemoryStore::new();
        store.set("a", 200, "", body("1"), Duration::from_secs(60));
        store.set("b", 200, "", body("2"), Duration::from_secs(60));

        store.clear();
        assert!(store.is_empty());

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite_replaces_whole_entry() {
        let store = MemoryStore::new();

        store.set("key1", 201, "application/json", body("v1"), Duration::from_secs(60));
        store.set("key1", 0, "", body("v2"), Duration::from_secs(60));

        let entry = store.get("key1").unwrap();
        assert_eq!(entry.body().as_ref(), b"v2");
        assert_eq!(entry.status_code(), StatusCode::OK);
        assert_eq!(entry.content_type(), crate::cache::DEFAULT_CONTENT_TYPE);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_lazy_expiration_without_gc() {
        let store = MemoryStore::new();
        store.set("key1", 200, "", body("value1"), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.get("key1").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("key1").is_none());
        assert_eq!(store.len(), 0, "expired entry should be removed on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_purge_expired() {
        let store = MemoryStore::new();

        store.set("short", 200, "", body("1"), Duration::from_secs(3));
        store.set("long", 200, "", body("2"), Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_stats() {
        let store = MemoryStore::new();

        store.set("key1", 200, "", body("value1"), Duration::from_secs(5));
        store.get("key1"); // hit
        store.get("nonexistent"); // miss
        tokio::time::advance(Duration::from_secs(6)).await;
        store.get("key1"); // expired miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_gc_refused_at_or_below_floor() {
        let store = Arc::new(MemoryStore::new());

        assert!(!store.start_gc(Duration::from_secs(1)));
        assert!(!store.start_gc(MINIMUM_ALLOWED_DURATION));
        assert!(!store.gc_running());

        // A refused start does not consume the one allowed start
        assert!(store.start_gc(Duration::from_secs(3)));
        store.close();
    }

    #[tokio::test]
    async fn test_gc_starts_once() {
        let store = Arc::new(MemoryStore::new());

        assert!(store.start_gc(Duration::from_secs(30)));
        assert!(!store.start_gc(Duration::from_secs(30)));
        assert!(store.gc_running());

        store.close();
    }

    #[test]
    fn test_gc_refused_without_runtime() {
        let store = Arc::new(MemoryStore::new());
        assert!(!store.start_gc(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_close_stops_gc() {
        let store = MemoryStore::with_gc(Duration::from_secs(30));
        assert!(store.gc_running());

        store.close();
        tokio::task::yield_now().await;

        assert!(!store.gc_running());
    }
}
