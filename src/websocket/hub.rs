//! WebSocket Connection Hub
//!
//! Registry of connected dashboards and the broadcast fan-out. Each
//! connection owns an unbounded mpsc queue drained by its own writer task,
//! so pushing a snapshot never waits on socket I/O.
//!
//! Connect protocol: register first, then read the store snapshot and queue
//! it. Any apply whose broadcast missed the new registration finished its
//! write before that read, so the connect snapshot already contains it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::pipeline::SnapshotSink;
use crate::store::{SensorStore, Snapshot};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and snapshot fan-out
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Source of the connect-time snapshot
    store: Arc<SensorStore>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig, store: Arc<SensorStore>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            store,
            config,
        }
    }

    /// Register a connection and queue the current snapshot for it
    ///
    /// After this returns the connection receives every later broadcast.
    pub async fn connect(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let id = self.register(sender).await?;

        let snapshot = self.store.snapshot().await;
        tracing::debug!(
            connection_id = %id,
            version = snapshot.version,
            "Sending initial snapshot"
        );
        if let Err(e) = self
            .send_to(&id, ServerMessage::sensor_update(snapshot))
            .await
        {
            self.unregister(&id).await;
            return Err(e);
        }

        Ok(id)
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(id.clone(), ConnectionHandle { sender });

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection; it receives nothing afterwards
    pub async fn unregister(&self, id: &str) {
        if self.connections.write().await.remove(id).is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Push a snapshot to every registered connection
    ///
    /// Best effort: a connection whose queue is closed simply misses it.
    /// Returns the number of connections the snapshot was queued for.
    pub async fn broadcast(&self, snapshot: Arc<Snapshot>) -> usize {
        let senders: Vec<mpsc::UnboundedSender<ServerMessage>> = self
            .connections
            .read()
            .await
            .values()
            .map(|h| h.sender.clone())
            .collect();

        let message = ServerMessage::sensor_update(snapshot);
        let sent_count = senders
            .iter()
            .filter(|s| s.send(message.clone()).is_ok())
            .count();

        tracing::trace!(
            connections = senders.len(),
            delivered = sent_count,
            "Broadcast snapshot"
        );
        sent_count
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl SnapshotSink for ConnectionHub {
    async fn publish(&self, snapshot: Arc<Snapshot>) {
        self.broadcast(snapshot).await;
    }
}

/// Per-connection filter that keeps snapshots moving forward
///
/// A broadcast can be queued after the newer connect snapshot; the writer
/// drops any snapshot whose version is not newer than the last one sent.
#[derive(Debug, Default)]
pub struct SnapshotGate {
    last_version: Option<u64>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `message` should be written to the socket
    pub fn admit(&mut self, message: &ServerMessage) -> bool {
        match message {
            ServerMessage::SensorUpdate(snapshot) => match self.last_version {
                Some(last) if snapshot.version <= last => false,
                _ => {
                    self.last_version = Some(snapshot.version);
                    true
                }
            },
            _ => true,
        }
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
