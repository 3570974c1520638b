use std::sync::Arc;
use swarmscrape_core::{Config, RunScheduler, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<RunScheduler>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<RunScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn scheduler(&self) -> &RunScheduler {
        self.scheduler.as_ref()
    }
}
