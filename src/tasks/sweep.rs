//! GC Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::MemoryStore;

/// Spawns a background task that periodically purges expired entries.
///
/// The first sweep runs one full interval after the spawn. Each tick takes
/// the store's write lock once for a full-table scan. The task only holds a
/// weak reference, so it ends on its own once the store is dropped.
///
/// # Arguments
/// * `runtime` - Runtime the task is spawned on
/// * `store` - Weak reference to the store to sweep
/// * `interval` - Time between two sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, used by the store to abort it on close.
pub fn spawn_sweep_task(
    runtime: &Handle,
    store: Weak<MemoryStore>,
    interval: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(store) = store.upgrade() else {
                info!("Store dropped, GC sweep exiting");
                break;
            };

            let removed = store.purge_expired();
            if removed > 0 {
                info!("GC sweep: removed {} expired entries", removed);
            } else {
                debug!("GC sweep: no expired entries found");
            }
        }
    })
}
