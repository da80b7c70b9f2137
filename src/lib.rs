//! # Sensor Relay
//!
//! Relays periodic sensor readings from an MQTT bus to connected WebSocket
//! dashboards, keeping a bounded in-memory history for charting.
//!
//! ## Features
//!
//! - **Bounded history**: last N readings per channel, FIFO eviction
//! - **Consistent snapshots**: one lock guards history and live values
//! - **Real-time**: every applied reading is pushed to all WebSocket clients
//! - **Pull queries**: current values and history over plain HTTP
//!
//! ## Modules
//!
//! - [`store`]: History store, live state and the lock-guarded `SensorStore`
//! - [`pipeline`]: Validate → apply → broadcast
//! - [`ingest`]: MQTT event source and ingestion adapter
//! - [`websocket`]: Connection hub and WebSocket handler
//! - [`api`]: HTTP API server with Axum
//! - [`config`]: TOML + environment configuration
//!
//! ## Data flow
//!
//! ```text
//! MQTT ─▶ ingest ─▶ pipeline ─▶ store ─▶ websocket hub ─▶ clients
//!                                  ▲
//!                     api (GET) ───┘
//! ```

pub mod api;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use store::{
    CurrentReadings, HistoryMap, HistoryStore, LiveState, Reading, SensorStore, Snapshot,
    StoreError, StoreResult,
};

pub use pipeline::{SnapshotSink, UpdatePipeline};

pub use ingest::{
    BusStatus, InboundMessage, IngestAdapter, IngestError, IngestResult, MqttSource, TopicMap,
};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    ApiConfig, ChannelConfig, Config, ConfigError, DefaultLoad, LoggingConfig, MqttConfig,
};
