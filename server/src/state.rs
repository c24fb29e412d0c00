//! Application state for the viewer service.

use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;
use engine::ConnectionCache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cache: Arc<ConnectionCache>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        let cache = Arc::new(ConnectionCache::new(Duration::from_secs(
            config.connect_timeout_secs,
        )));
        Self { config, cache }
    }
}
