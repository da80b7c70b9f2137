//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::store::{SeedRange, RESERVED_KEYS};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub mqtt: MqttConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP / WebSocket server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Message bus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_broker")]
    pub broker: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Pause between reconnect attempts after a bus error
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Capacity of the client request queue and of the ingestion channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_broker() -> String {
    "127.0.0.1".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_keep_alive() -> u64 {
    60
}

fn default_client_id() -> String {
    "sensor-relay".to_string()
}

fn default_topic_prefix() -> String {
    "iot/sensor/".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_event_capacity() -> usize {
    64
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: default_broker(),
            port: default_broker_port(),
            keep_alive_secs: default_keep_alive(),
            client_id: default_client_id(),
            topic_prefix: default_topic_prefix(),
            reconnect_delay_ms: default_reconnect_delay(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// In-memory history configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Readings kept per channel
    #[serde(default = "default_max_history")]
    pub max_len: usize,

    /// Pre-fill every channel with synthetic readings at startup
    #[serde(default)]
    pub seed: bool,
}

fn default_max_history() -> usize {
    30
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_history(),
            seed: false,
        }
    }
}

/// One tracked channel
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChannelConfig {
    pub name: String,

    /// Lower bound for seeded readings
    #[serde(default)]
    pub seed_min: f64,

    /// Upper bound for seeded readings
    #[serde(default = "default_seed_max")]
    pub seed_max: f64,
}

fn default_seed_max() -> f64 {
    100.0
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, seed_min: f64, seed_max: f64) -> Self {
        Self {
            name: name.into(),
            seed_min,
            seed_max,
        }
    }
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("temperature", 20.0, 30.0),
        ChannelConfig::new("humidity", 40.0, 80.0),
    ]
}

/// WebSocket hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_connections() -> usize {
    1000
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Nothing is logged here; this runs before the subscriber exists, so
    /// the caller reports `source` and `failures` once logging is up.
    pub fn load_default() -> DefaultLoad {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("sensor-relay").join("config.toml")),
            Some(PathBuf::from("/etc/sensor-relay/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first of `paths` that exists and is valid
    ///
    /// Existing files that fail to load are collected in
    /// [`DefaultLoad::failures`]; defaults are used if none succeeds.
    pub fn load_first<P: AsRef<Path>>(paths: &[P]) -> DefaultLoad {
        let mut failures = Vec::new();

        for path in paths {
            let path: &Path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::load_with_env(path) {
                Ok(config) => {
                    return DefaultLoad {
                        config,
                        source: Some(path.to_path_buf()),
                        failures,
                    };
                }
                Err(e) => failures.push((path.to_path_buf(), e)),
            }
        }

        DefaultLoad {
            config: Self::from_env(),
            source: None,
            failures,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Broker address; MQTT_BROKER is honored for compatibility with
        // existing device deployments
        if let Ok(broker) =
            std::env::var("SENSOR_RELAY_MQTT_BROKER").or_else(|_| std::env::var("MQTT_BROKER"))
        {
            self.mqtt.broker = broker;
        }

        // API overrides
        if let Ok(host) = std::env::var("SENSOR_RELAY_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("SENSOR_RELAY_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("SENSOR_RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SENSOR_RELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check invariants the rest of the system relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_len == 0 {
            return Err(ConfigError::Invalid(
                "history.max_len must be at least 1".to_string(),
            ));
        }

        if self.channels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one channel must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.name.is_empty() {
                return Err(ConfigError::Invalid("channel name cannot be empty".to_string()));
            }
            if RESERVED_KEYS.contains(&channel.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "channel name '{}' is reserved",
                    channel.name
                )));
            }
            if !seen.insert(channel.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate channel '{}'",
                    channel.name
                )));
            }
        }

        Ok(())
    }

    /// Channel names in configuration order
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    /// Seed ranges for every channel
    pub fn seed_ranges(&self) -> Vec<SeedRange> {
        self.channels
            .iter()
            .map(|c| SeedRange {
                channel: c.name.clone(),
                min: c.seed_min,
                max: c.seed_max,
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            mqtt: MqttConfig::default(),
            history: HistoryConfig::default(),
            channels: default_channels(),
            hub: HubSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Result of searching the default config locations
#[derive(Debug)]
pub struct DefaultLoad {
    pub config: Config,
    /// File the config was read from, `None` when running on defaults
    pub source: Option<PathBuf>,
    /// Files that exist but could not be loaded
    pub failures: Vec<(PathBuf, ConfigError)>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Sensor Relay Configuration
#
# Environment variables override these settings:
# - SENSOR_RELAY_MQTT_BROKER (or MQTT_BROKER)
# - SENSOR_RELAY_HOST
# - SENSOR_RELAY_PORT
# - SENSOR_RELAY_LOG_LEVEL
# - SENSOR_RELAY_LOG_FORMAT

[api]
# HTTP / WebSocket server host
host = "0.0.0.0"

# HTTP / WebSocket server port
port = 5000

[mqtt]
# Broker address
broker = "127.0.0.1"

# Broker port
port = 1883

# Keep-alive interval (seconds)
keep_alive_secs = 60

# MQTT client identifier
client_id = "sensor-relay"

# Channel topics are <topic_prefix><channel name>
topic_prefix = "iot/sensor/"

# Pause between reconnect attempts (ms)
reconnect_delay_ms = 5000

[history]
# Readings kept per channel
max_len = 30

# Pre-fill charts with synthetic readings at startup
seed = false

[[channels]]
name = "temperature"
seed_min = 20.0
seed_max = 30.0

[[channels]]
name = "humidity"
seed_min = 40.0
seed_max = 80.0

[hub]
# Maximum concurrent WebSocket clients
max_connections = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
