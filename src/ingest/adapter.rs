//! Ingestion Adapter
//!
//! Consumes `(topic, payload)` events, resolves the channel, decodes the
//! value and drives the [`UpdatePipeline`]. Bad messages are logged and
//! dropped; they never reach the pipeline and never stop the loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::decode::{decode_payload, TopicMap};
use super::error::IngestResult;
use super::mqtt::InboundMessage;
use crate::pipeline::UpdatePipeline;
use crate::store::Snapshot;

pub struct IngestAdapter {
    topics: TopicMap,
    pipeline: Arc<UpdatePipeline>,
    rejected: AtomicU64,
}

impl IngestAdapter {
    pub fn new(topics: TopicMap, pipeline: Arc<UpdatePipeline>) -> Self {
        Self {
            topics,
            pipeline,
            rejected: AtomicU64::new(0),
        }
    }

    /// Handle a single bus message
    pub async fn handle(&self, message: &InboundMessage) -> IngestResult<Arc<Snapshot>> {
        let channel = self.topics.channel_for(&message.topic)?;
        let value = decode_payload(&message.payload)?;
        let snapshot = self.pipeline.apply(channel, value, None).await?;
        Ok(snapshot)
    }

    /// Consume messages until the sender side closes
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = rx.recv().await {
            if let Err(e) = self.handle(&message).await {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(topic = %message.topic, error = %e, "Discarded bus message");
            }
        }
        tracing::info!("Bus message stream closed");
    }

    pub fn spawn(self: Arc<Self>, rx: mpsc::Receiver<InboundMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Messages discarded since startup
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.topics()
    }
}
