use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sensor_watch::{
    config::{Config, read_config_file},
    dispatch::AlertDispatcher,
    gate::PersistenceGate,
    gateway::FonnteGateway,
    scheduler::{IngestionHandle, IngestionScheduler},
    source::HttpReadingSource,
    storage::{self, ReadingStore},
    thresholds::ThresholdEvaluator,
};
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Log level for this crate (error, warn, info, debug, trace)
    #[arg(long, default_value = "trace")]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new()
        .with_targets(vec![("sensor_watch", level), ("sensor_watch_hub", level)])
        .with_default(LevelFilter::WARN);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let store = storage::open(&config.storage).await?;

    #[cfg(feature = "api")]
    spawn_api(&config, store.clone()).await?;

    let scheduler = build_scheduler(&config, store.clone())?;
    let (handle, task) =
        IngestionHandle::spawn(scheduler, Duration::from_secs(config.interval_secs));

    info!("polling {} every {}s", config.source.url, config.interval_secs);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if let Err(e) = handle.shutdown().await {
        error!("{e:#}");
    }
    if let Err(e) = task.await {
        error!("ingestion task failed: {e}");
    }

    store.close().await?;

    Ok(())
}

fn build_scheduler(
    config: &Config,
    store: Arc<dyn ReadingStore>,
) -> anyhow::Result<IngestionScheduler> {
    let source = HttpReadingSource::new(&config.source)?;

    let dispatcher = match &config.gateway {
        Some(gateway) => Some(AlertDispatcher::new(Arc::new(FonnteGateway::new(gateway)?))),
        None => {
            warn!("no gateway configured, alerts will only be logged");
            None
        }
    };

    Ok(IngestionScheduler::new(
        Arc::new(source),
        PersistenceGate::new(store),
        ThresholdEvaluator::new(config.thresholds),
        dispatcher,
    ))
}

#[cfg(feature = "api")]
async fn spawn_api(config: &Config, store: Arc<dyn ReadingStore>) -> anyhow::Result<()> {
    use sensor_watch::api::{ApiState, spawn_api_server};

    let Some(api) = config.api.clone() else {
        return Ok(());
    };

    let state = ApiState::new(store, ThresholdEvaluator::new(config.thresholds));
    spawn_api_server(api, state).await?;
    Ok(())
}
