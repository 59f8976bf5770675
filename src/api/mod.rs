//! API Module
//!
//! Server role of the distributed cache: HTTP handlers and routing that
//! expose a store to remote clients.
//!
//! # Endpoints
//! - `GET /?cache_key=K` - Replay the entry stored under K
//! - `POST /?cache_key=K&cache_duration=S&cache_status_code=C&cache_content_type=T` - Store the body under K
//! - `DELETE /?cache_key=K` - Remove the entry stored under K
//! - `GET /stats` - Get store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
