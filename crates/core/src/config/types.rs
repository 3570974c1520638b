use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::ScrapeConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub worker: WorkerConfig,
    pub staleness: StalenessConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Base URL of the store API (e.g., "http://localhost:3000")
    pub endpoint: String,
    /// Address of the record collection inside the store
    pub address: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    30
}

/// This worker's place in the fleet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Total number of cooperating workers
    pub count: usize,
    /// 1-indexed position of this worker
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StalenessConfig {
    /// A facet older than this many seconds is re-scraped
    pub max_stale_secs: u64,
}

/// Run cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Seconds between run triggers (default: 300)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    300
}

/// Externally supplied merge inputs, re-read every run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputsConfig {
    /// JSON array of announce URLs added to every record
    #[serde(default)]
    pub trackers_file: Option<PathBuf>,
    /// JSON array of corrections keyed by `_id`
    #[serde(default)]
    pub updates_file: Option<PathBuf>,
}

/// Status server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    9090
}

/// Sanitized config for API responses (store address redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub store: SanitizedStoreConfig,
    pub worker: WorkerConfig,
    pub staleness: StalenessConfig,
    pub scrape: ScrapeConfig,
    pub schedule: ScheduleConfig,
    pub inputs: InputsConfig,
    pub server: ServerConfig,
}

/// Sanitized store config (collection address hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStoreConfig {
    pub endpoint: String,
    pub address_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            store: SanitizedStoreConfig {
                endpoint: config.store.endpoint.clone(),
                address_configured: !config.store.address.is_empty(),
                timeout_secs: config.store.timeout_secs,
            },
            worker: config.worker.clone(),
            staleness: config.staleness.clone(),
            scrape: config.scrape.clone(),
            schedule: config.schedule.clone(),
            inputs: config.inputs.clone(),
            server: config.server.clone(),
        }
    }
}
