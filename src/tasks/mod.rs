//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a store is alive.
//!
//! # Tasks
//! - GC sweep: removes expired cache entries at the configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
