//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::ingest::{BusStatus, IngestAdapter};
use crate::pipeline::UpdatePipeline;
use crate::store::SensorStore;
use crate::websocket::ConnectionHub;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Sensor state read by the pull endpoints
    pub store: Arc<SensorStore>,
    /// WebSocket connection hub for real-time streaming
    pub ws_hub: Arc<ConnectionHub>,
    /// Pipeline, for the applied-readings counter
    pub pipeline: Arc<UpdatePipeline>,
    /// Ingestion adapter, for the rejected-messages counter
    pub ingest: Option<Arc<IngestAdapter>>,
    /// Broker connectivity
    pub bus_status: Arc<BusStatus>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<SensorStore>,
        ws_hub: Arc<ConnectionHub>,
        pipeline: Arc<UpdatePipeline>,
        bus_status: Arc<BusStatus>,
    ) -> Self {
        Self {
            store,
            ws_hub,
            pipeline,
            ingest: None,
            bus_status,
            start_time: Instant::now(),
        }
    }

    /// Attach the ingestion adapter whose counters `/health` reports
    pub fn with_ingest(mut self, ingest: Arc<IngestAdapter>) -> Self {
        self.ingest = Some(ingest);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }

    pub fn messages_rejected(&self) -> u64 {
        self.ingest.as_ref().map(|i| i.rejected_count()).unwrap_or(0)
    }
}
