//! Sensor Simulator
//!
//! Publishes one random reading per channel to the broker at a fixed
//! interval, in the format the relay ingests.
//!
//! Run with: cargo run --bin sensor-simulator -- --channel temperature:20:30
//!
//! # Configuration
//!
//! - `MQTT_BROKER`: Broker address (default: 127.0.0.1)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::bail;
use clap::Parser;
use rand::Rng;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use sensor_relay::config::MqttConfig;
use sensor_relay::ingest::mqtt_options;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sensor-simulator", version, about = "Publish random sensor readings over MQTT")]
struct Args {
    /// Broker address
    #[arg(long, env = "MQTT_BROKER", default_value = "127.0.0.1")]
    broker: String,

    /// Broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,

    /// Topic prefix; readings go to <prefix><channel>
    #[arg(long, default_value = "iot/sensor/")]
    topic_prefix: String,

    /// Channel as name:min:max (repeatable)
    #[arg(long = "channel", value_name = "NAME:MIN:MAX")]
    channels: Vec<ChannelRange>,

    /// Seconds between publish rounds
    #[arg(long, default_value_t = 3)]
    interval_secs: u64,

    /// Connection attempts before giving up
    #[arg(long, default_value_t = 10)]
    max_retries: u32,

    /// Seconds between connection attempts
    #[arg(long, default_value_t = 5)]
    retry_delay_secs: u64,
}

/// A simulated channel and its value range
#[derive(Debug, Clone, PartialEq)]
struct ChannelRange {
    name: String,
    min: f64,
    max: f64,
}

impl ChannelRange {
    fn new(name: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
        }
    }

    /// Random value in range, rounded to one decimal
    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        (rng.gen_range(self.min..=self.max) * 10.0).round() / 10.0
    }
}

impl FromStr for ChannelRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [name, min, max] = parts.as_slice() else {
            return Err(format!("expected NAME:MIN:MAX, got '{}'", s));
        };

        if name.is_empty() {
            return Err("channel name cannot be empty".to_string());
        }
        let min: f64 = min.parse().map_err(|_| format!("invalid min '{}'", min))?;
        let max: f64 = max.parse().map_err(|_| format!("invalid max '{}'", max))?;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(format!("invalid range {}..{}", min, max));
        }

        Ok(ChannelRange::new(name, min, max))
    }
}

fn default_channels() -> Vec<ChannelRange> {
    vec![
        ChannelRange::new("temperature", 20.0, 30.0),
        ChannelRange::new("humidity", 40.0, 80.0),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor_simulator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let channels = if args.channels.is_empty() {
        default_channels()
    } else {
        args.channels.clone()
    };

    let config = MqttConfig {
        broker: args.broker.clone(),
        port: args.port,
        client_id: format!("sensor-simulator-{}", uuid::Uuid::new_v4()),
        ..MqttConfig::default()
    };
    let (client, mut eventloop) = AsyncClient::new(mqtt_options(&config), 16);

    wait_for_connack(&mut eventloop, &args).await?;

    // Keep driving the event loop; rumqttc reconnects on the next poll
    let retry_delay = Duration::from_secs(args.retry_delay_secs);
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                tracing::warn!(error = %e, "MQTT connection error, reconnecting");
                tokio::time::sleep(retry_delay).await;
            }
        }
    });

    tracing::info!(channels = ?channels, "Started sending data");
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs.max(1)));

    loop {
        ticker.tick().await;

        let readings: Vec<(String, f64)> = {
            let mut rng = rand::thread_rng();
            channels.iter().map(|c| (c.name.clone(), c.sample(&mut rng))).collect()
        };

        for (name, value) in readings {
            let topic = format!("{}{}", args.topic_prefix, name);
            match client
                .publish(&topic, QoS::AtMostOnce, false, value.to_string())
                .await
            {
                Ok(()) => tracing::info!(topic = %topic, value, "Published"),
                Err(e) => tracing::warn!(topic = %topic, error = %e, "Publish failed"),
            }
        }
    }
}

/// Poll until the broker accepts the connection, retrying a bounded number of times
async fn wait_for_connack(eventloop: &mut EventLoop, args: &Args) -> anyhow::Result<()> {
    for attempt in 1..=args.max_retries {
        tracing::info!(
            broker = %args.broker,
            port = args.port,
            attempt,
            max_retries = args.max_retries,
            "Connecting to MQTT broker"
        );

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("Connected to MQTT broker");
                    return Ok(());
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT connection failed");
                    break;
                }
            }
        }

        tokio::time::sleep(Duration::from_secs(args.retry_delay_secs)).await;
    }

    bail!(
        "failed to connect to MQTT broker at {}:{} after {} attempts",
        args.broker,
        args.port,
        args.max_retries
    )
}
