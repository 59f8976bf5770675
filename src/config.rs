//! Configuration Module
//!
//! Handles loading and managing server and client configuration from
//! environment variables.

use std::env;
use std::time::Duration;

/// Default HTTP port of the remote cache server
pub const DEFAULT_SERVER_PORT: u16 = 3000;
/// Default time between two GC sweeps of a memory store
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Default timeout of every remote cache call
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background GC sweep interval; at or below the TTL floor disables it
    pub gc_interval: Duration,
    /// Timeout applied to every remote cache call
    pub remote_timeout: Duration,
    /// Address of the remote cache server, for client engines
    pub remote_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `GC_INTERVAL` - GC sweep frequency in seconds (default: 1800)
    /// - `REMOTE_TIMEOUT` - Remote call timeout in seconds (default: 5)
    /// - `REMOTE_URL` - Remote cache address (default: unset)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            gc_interval: env::var("GC_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GC_INTERVAL),
            remote_timeout: env::var("REMOTE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT),
            remote_url: env::var("REMOTE_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            gc_interval: DEFAULT_GC_INTERVAL,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            remote_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.gc_interval, Duration::from_secs(1800));
        assert_eq!(config.remote_timeout, Duration::from_secs(5));
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("GC_INTERVAL");
        env::remove_var("REMOTE_TIMEOUT");
        env::remove_var("REMOTE_URL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.gc_interval, DEFAULT_GC_INTERVAL);
        assert_eq!(config.remote_timeout, DEFAULT_REMOTE_TIMEOUT);
        assert!(config.remote_url.is_none());
    }
}
