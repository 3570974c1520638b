pub mod config;
pub mod dht;
pub mod merger;
pub mod metrics;
pub mod orchestrator;
pub mod populate;
pub mod record;
pub mod scheduler;
pub mod shard;
pub mod staleness;
pub mod store;
pub mod testing;
pub mod tracker;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig, CONFIG_PATH_ENV,
};
pub use dht::{scrape_dht, DhtError, LibrqbitDht, PeerDiscovery};
pub use merger::{Correction, CorrectionSet, ExtraTrackers, MergeError, MergeReport, UpdateMerger};
pub use orchestrator::{
    OrchestratorError, ScrapeConfig, ScrapeOrchestrator, ScrapeOutcome, ScrapeReport,
};
pub use populate::{load_seed_records, populate, PopulateError, PopulateReport};
pub use record::{parse_info_hash, DhtResult, Record, TrackerResult};
pub use scheduler::{RunPipeline, RunScheduler, RunSummary, SchedulerStatus};
pub use shard::{select_shard, shard_bounds, sort_records, ShardAssignment, ShardError};
pub use staleness::{Clock, FixedClock, StalenessPolicy, SystemClock};
pub use store::{CollectionPaths, HttpRecordStore, RecordStore, StoreError};
pub use tracker::{
    scrape_tracker, HttpTrackerScraper, SchemeTrackerScraper, ScrapeStats, TrackerError,
    TrackerScraper, UdpTrackerScraper,
};
