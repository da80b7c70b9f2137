//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboards and the relay.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::Snapshot;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Free-form message, logged only
    Message {
        text: String,
    },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
///
/// Serialized as `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full current state, on connect and after every applied reading
    SensorUpdate(Arc<Snapshot>),
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl ServerMessage {
    pub fn sensor_update(snapshot: Arc<Snapshot>) -> Self {
        ServerMessage::SensorUpdate(snapshot)
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
