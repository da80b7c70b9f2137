//! Telemetry Ingestion
//!
//! ```text
//! broker ──MQTT──▶ MqttSource ──mpsc<InboundMessage>──▶ IngestAdapter ──▶ UpdatePipeline
//! ```
//!
//! - **mqtt**: rumqttc event loop, re-subscribes on every connect
//! - **decode**: payload → `f64`, topic → channel
//! - **adapter**: per-message handling, errors logged and discarded
//! - **error**: error types

pub mod adapter;
pub mod decode;
pub mod error;
pub mod mqtt;

pub use adapter::IngestAdapter;
pub use decode::{decode_payload, TopicMap};
pub use error::{IngestError, IngestResult};
pub use mqtt::{mqtt_options, BusStatus, InboundMessage, MqttSource};
