//! Remote Module
//!
//! Client role of the distributed cache: talks to a cache server over HTTP
//! using the query-parameter protocol served by [`crate::api`].

mod client;
mod uri;

pub use client::{RemoteClient, RemoteEntry};
pub use uri::{normalize_remote_url, RemoteUri};
