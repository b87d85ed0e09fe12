use std::sync::Arc;

use trafficcmp_core::config::Config;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Holds no per-request data: every analysis builds its own report and
/// cleans up its own uploads.
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
