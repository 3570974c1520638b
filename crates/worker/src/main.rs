use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use swarmscrape_core::{
    load_config_from_env, load_seed_records, populate, validate_config, Clock, CollectionPaths,
    Config, HttpRecordStore, LibrqbitDht, PeerDiscovery, RecordStore, RunPipeline, RunScheduler,
    SchemeTrackerScraper, ScrapeOrchestrator, ShardAssignment, StalenessPolicy, SystemClock,
    TrackerScraper, CONFIG_PATH_ENV,
};

use swarmscrape_worker::api::create_router;
use swarmscrape_worker::state::AppState;

/// Set to any value to switch log output to JSON lines.
const LOG_JSON_ENV: &str = "SWARMSCRAPE_LOG_JSON";

#[derive(Parser, Debug)]
#[command(name = "swarmscrape")]
#[command(about = "Sharded DHT and tracker liveness scraper")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scrape worker (default)
    Run,
    /// Write records from a JSON file that are missing from the store, then exit
    Populate {
        /// JSON array of records
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run().await,
        Command::Populate { file } => run_populate(file).await,
    };
    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    let fmt_layer = if std::env::var_os(LOG_JSON_ENV).is_some() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_config() -> Result<Config> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("Loading configuration from environment"),
    }
    let config = load_config_from_env().context("Failed to load configuration")?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

fn record_store(config: &Config) -> (Arc<dyn RecordStore>, CollectionPaths) {
    let store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(
        config.store.endpoint.clone(),
        Duration::from_secs(config.store.timeout_secs),
    ));
    (store, CollectionPaths::new(&config.store.address))
}

async fn run_populate(file: PathBuf) -> Result<()> {
    let config = load_config()?;
    info!("Record store: {}", config.store.endpoint);

    let records = load_seed_records(&file)
        .await
        .context("Failed to load seed records")?;
    let (store, paths) = record_store(&config);

    store
        .open(paths.collection(), &json!({ "awaitOpen": true }))
        .await
        .context("Failed to open record collection")?;

    let report = populate(store.as_ref(), &paths, records)
        .await
        .context("Failed to populate record collection")?;
    info!(
        "Populated {} of {} records ({} already in store)",
        report.written, report.seeded, report.existing
    );

    Ok(())
}

async fn run() -> Result<()> {
    let config = load_config()?;
    info!(
        "Worker {} of {}, max staleness {}s",
        config.worker.index, config.worker.count, config.staleness.max_stale_secs
    );
    info!("Record store: {}", config.store.endpoint);

    // Record store client
    let (store, paths) = record_store(&config);

    // Ask the store to start loading the collection without waiting for it
    {
        let store = Arc::clone(&store);
        let collection = paths.collection().to_string();
        tokio::spawn(async move {
            match store.open(&collection, &json!({ "awaitOpen": false })).await {
                Ok(_) => info!("Record collection open requested"),
                Err(e) => warn!("Failed to request collection open: {}", e),
            }
        });
    }

    // DHT node
    let discovery: Arc<dyn PeerDiscovery> = Arc::new(
        LibrqbitDht::new(Duration::from_secs(config.scrape.dht_lookup_secs))
            .await
            .context("Failed to start DHT node")?,
    );
    info!("Using peer discovery: {}", discovery.name());

    // Tracker scrapers
    let scraper: Arc<dyn TrackerScraper> = Arc::new(SchemeTrackerScraper::new(
        Duration::from_secs(config.scrape.tracker_timeout_secs),
    ));

    let assignment = ShardAssignment::new(config.worker.count, config.worker.index)
        .context("Invalid worker assignment")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let policy = StalenessPolicy::new(config.staleness.max_stale_secs);

    let orchestrator = ScrapeOrchestrator::new(
        config.scrape.clone(),
        policy,
        clock,
        Arc::clone(&store),
        paths.clone(),
        discovery,
        scraper,
    );
    let pipeline = Arc::new(RunPipeline::new(
        store,
        paths,
        assignment,
        config.inputs.clone(),
        orchestrator,
    ));

    // Start the run scheduler
    let scheduler = Arc::new(RunScheduler::new(config.schedule.clone(), pipeline));
    scheduler.start().await;
    info!(
        "Run scheduler started (every {}s)",
        config.schedule.interval_secs
    );

    if config.server.enabled {
        let state = Arc::new(AppState::new(config.clone(), Arc::clone(&scheduler)));
        let app = create_router(state);

        let addr = SocketAddr::new(config.server.host, config.server.port);
        info!("Starting status server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
    } else {
        info!("Status server disabled in config");
        shutdown_signal().await;
    }

    info!("Stopping run scheduler...");
    scheduler.stop().await;
    info!("Run scheduler stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
