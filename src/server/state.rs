//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across connection tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::hub::BroadcastHub;
use crate::normalize::LogFormat;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Hub every connection subscribes to
    pub hub: Arc<BroadcastHub>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Input format reported by the health endpoint
    pub format: LogFormat,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(hub: Arc<BroadcastHub>, config: ServerConfig, format: LogFormat) -> Self {
        Self {
            hub,
            config: Arc::new(config),
            format,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
