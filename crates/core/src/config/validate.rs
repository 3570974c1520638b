use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Store endpoint is an http(s) URL and the address is set
/// - Worker index lies in 1..=count
/// - Staleness threshold and run interval are non-zero
/// - Server port is not 0 when the status server is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let endpoint = config.store.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "store.endpoint is required".to_string(),
        ));
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "store.endpoint must be an http(s) URL, got {}",
            endpoint
        )));
    }
    if config.store.address.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "store.address is required".to_string(),
        ));
    }

    // Worker validation
    if config.worker.count == 0 {
        return Err(ConfigError::ValidationError(
            "worker.count must be at least 1".to_string(),
        ));
    }
    if config.worker.index == 0 || config.worker.index > config.worker.count {
        return Err(ConfigError::ValidationError(format!(
            "worker.index must be between 1 and {}, got {}",
            config.worker.count, config.worker.index
        )));
    }

    if config.staleness.max_stale_secs == 0 {
        return Err(ConfigError::ValidationError(
            "staleness.max_stale_secs cannot be 0".to_string(),
        ));
    }
    if config.schedule.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.interval_secs cannot be 0".to_string(),
        ));
    }

    // Server validation
    if config.server.enabled && config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
