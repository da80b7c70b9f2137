//! Sensor Relay Server
//!
//! Run with: cargo run --bin sensor-relay -- [--config <path>]
//!
//! # Configuration
//!
//! A TOML file (see `--print-config`) plus environment overrides:
//! - `SENSOR_RELAY_MQTT_BROKER` / `MQTT_BROKER`: Broker address (default: 127.0.0.1)
//! - `SENSOR_RELAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `SENSOR_RELAY_PORT`: Port to listen on (default: 5000)
//! - `SENSOR_RELAY_LOG_LEVEL`, `SENSOR_RELAY_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use anyhow::Context;
use clap::Parser;
use sensor_relay::config::{generate_default_config, Config, DefaultLoad, LoggingConfig};
use sensor_relay::ingest::{BusStatus, IngestAdapter, MqttSource, TopicMap};
use sensor_relay::pipeline::{SnapshotSink, UpdatePipeline};
use sensor_relay::store::{seed_history, SensorStore};
use sensor_relay::websocket::{ConnectionHub, HubConfig};
use sensor_relay::{serve, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sensor-relay", version, about = "Relay MQTT sensor readings to WebSocket dashboards")]
struct Args {
    /// Path to a TOML config file (default: standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let loaded = match &args.config {
        Some(path) => DefaultLoad {
            config: Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            source: Some(path.clone()),
            failures: Vec::new(),
        },
        None => Config::load_default(),
    };
    let config = loaded.config;

    init_tracing(&config.logging);

    for (path, e) in &loaded.failures {
        tracing::warn!(path = %path.display(), error = %e, "Failed to load config file");
    }
    match &loaded.source {
        Some(path) => tracing::info!(path = %path.display(), "Loaded config"),
        None => tracing::info!("Using default config with environment overrides"),
    }

    tracing::info!("Starting sensor relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        channels = ?config.channel_names(),
        max_history = config.history.max_len,
        "Tracking channels"
    );

    let channels = config.channel_names();
    let store = if config.history.seed {
        let now = chrono::Utc::now().timestamp_millis();
        let history = seed_history(
            &config.seed_ranges(),
            config.history.max_len,
            now,
            &mut rand::thread_rng(),
        );
        tracing::info!("History pre-seeded with synthetic readings");
        Arc::new(SensorStore::with_history(channels.as_slice(), history, Some(now)))
    } else {
        Arc::new(SensorStore::new(channels.as_slice(), config.history.max_len))
    };

    let hub = Arc::new(ConnectionHub::new(
        HubConfig {
            max_connections: config.hub.max_connections,
        },
        Arc::clone(&store),
    ));

    let pipeline = Arc::new(UpdatePipeline::new(
        Arc::clone(&store),
        Arc::clone(&hub) as Arc<dyn SnapshotSink>,
    ));

    // Ingestion: MQTT event loop → channel → adapter → pipeline
    let topics = TopicMap::new(&config.mqtt.topic_prefix, channels.as_slice());
    let adapter = Arc::new(IngestAdapter::new(topics, Arc::clone(&pipeline)));
    let bus_status = Arc::new(BusStatus::new());

    let (tx, rx) = mpsc::channel(config.mqtt.event_capacity.max(1));
    let source = MqttSource::new(&config.mqtt, adapter.topics(), Arc::clone(&bus_status));
    let bus_handle = source.spawn(tx);
    let ingest_handle = Arc::clone(&adapter).spawn(rx);

    let state = AppState::new(store, hub, pipeline, bus_status).with_ingest(adapter);

    tracing::info!("Starting server on {}", config.api.addr());
    let result = serve(state, &config.api).await;

    bus_handle.abort();
    ingest_handle.abort();

    result.context("API server failed")?;
    tracing::info!("Sensor relay stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "sensor_relay={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}
