//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::chat::ChatService;
use crate::config::ApiConfig;
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat coordinator: send, tail fetch, live subscriptions
    pub chat: Arc<ChatService>,
    /// Guest session registry
    pub registry: Arc<SessionRegistry>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        chat: Arc<ChatService>,
        registry: Arc<SessionRegistry>,
        config: ApiConfig,
    ) -> Self {
        Self {
            chat,
            registry,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
