//! Update Pipeline
//!
//! Validates a reading, applies it to the [`SensorStore`] and hands the
//! resulting snapshot to a [`SnapshotSink`]. The sink is only invoked after
//! the store lock has been released, with the snapshot built inside it.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::store::{Reading, SensorStore, Snapshot, StoreError, StoreResult};

/// Receiver of every snapshot produced by an apply
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Deliver a snapshot, best effort, without blocking on client I/O
    async fn publish(&self, snapshot: Arc<Snapshot>);
}

/// Applies readings and fans the resulting state out
pub struct UpdatePipeline {
    store: Arc<SensorStore>,
    sink: Arc<dyn SnapshotSink>,
    applied: AtomicU64,
}

impl UpdatePipeline {
    pub fn new(store: Arc<SensorStore>, sink: Arc<dyn SnapshotSink>) -> Self {
        Self {
            store,
            sink,
            applied: AtomicU64::new(0),
        }
    }

    /// Apply one value to a channel
    ///
    /// Without `received_at` the reading is stamped with the wall clock at
    /// apply time. On error nothing is stored and nothing is broadcast.
    pub async fn apply(
        &self,
        channel: &str,
        value: f64,
        received_at: Option<i64>,
    ) -> StoreResult<Arc<Snapshot>> {
        if !value.is_finite() {
            return Err(StoreError::NonFiniteValue {
                channel: channel.to_string(),
                value,
            });
        }

        let reading = match received_at {
            Some(ts) => Reading::with_timestamp(value, ts),
            None => Reading::now(value),
        };

        let snapshot = self.store.apply(channel, reading).await?;
        self.applied.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            channel = %channel,
            value,
            timestamp = reading.timestamp,
            version = snapshot.version,
            "Applied reading"
        );

        self.sink.publish(Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    /// Readings applied since startup
    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &Arc<SensorStore> {
        &self.store
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// Sink that records every published snapshot
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub published: Mutex<Vec<Arc<Snapshot>>>,
    }

    #[async_trait]
    impl SnapshotSink for RecordingSink {
        async fn publish(&self, snapshot: Arc<Snapshot>) {
            self.published.lock().await.push(snapshot);
        }
    }

    fn create_test_pipeline(max_history: usize) -> (UpdatePipeline, Arc<RecordingSink>) {
        let store = Arc::new(SensorStore::new(&["temperature", "humidity"], max_history));
        let sink = Arc::new(RecordingSink::default());
        let pipeline = UpdatePipeline::new(store, Arc::clone(&sink) as Arc<dyn SnapshotSink>);
        (pipeline, sink)
    }

    #[tokio::test]
    async fn test_apply_stores_then_broadcasts() {
        let (pipeline, sink) = create_test_pipeline(30);
        let snapshot = pipeline.apply("temperature", 21.0, Some(1000)).await.unwrap();

        let published = sink.published.lock().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], snapshot);
        // Broadcast state is already what a fresh read returns
        assert_eq!(*published[0], *pipeline.store().snapshot().await);
        assert_eq!(pipeline.applied_count(), 1);
    }

    #[tokio::test]
    async fn test_scenario_history_cap() {
        let (pipeline, sink) = create_test_pipeline(3);
        for (i, v) in [20.0, 21.0, 22.0, 23.0].iter().enumerate() {
            pipeline
                .apply("temperature", *v, Some(i as i64 + 1))
                .await
                .unwrap();
        }

        let store = pipeline.store();
        let history = store.channel_history("temperature").await.unwrap();
        let values: Vec<(f64, i64)> = history.iter().map(|r| (r.value, r.timestamp)).collect();
        assert_eq!(values, vec![(21.0, 2), (22.0, 3), (23.0, 4)]);

        let current = store.current().await;
        assert_eq!(current.value("temperature"), Some(23.0));
        assert_eq!(current.last_update, Some(4));
        assert_eq!(sink.published.lock().await.len(), 4);
    }

    #[tokio::test]
    async fn test_last_update_tracks_most_recent_apply_any_channel() {
        let (pipeline, _sink) = create_test_pipeline(30);
        pipeline.apply("temperature", 20.0, Some(500)).await.unwrap();
        pipeline.apply("humidity", 45.0, Some(300)).await.unwrap();

        let current = pipeline.store().current().await;
        assert_eq!(current.last_update, Some(300));
    }

    #[tokio::test]
    async fn test_wall_clock_timestamp_when_not_given() {
        let (pipeline, _sink) = create_test_pipeline(30);
        let before = chrono::Utc::now().timestamp_millis();
        let snapshot = pipeline.apply("humidity", 50.0, None).await.unwrap();
        let after = chrono::Utc::now().timestamp_millis();

        let ts = snapshot.current.last_update.unwrap();
        assert!(ts >= before && ts <= after);
        assert_eq!(snapshot.history_of("humidity")[0].timestamp, ts);
    }

    #[tokio::test]
    async fn test_rejected_values_have_no_effect() {
        let (pipeline, sink) = create_test_pipeline(30);
        let before = pipeline.store().snapshot().await;

        let err = pipeline.apply("temperature", f64::NAN, None).await;
        assert!(matches!(err, Err(StoreError::NonFiniteValue { .. })));

        let err = pipeline.apply("pressure", 1013.0, None).await;
        assert!(matches!(err, Err(StoreError::UnknownChannel(_))));

        assert_eq!(pipeline.store().snapshot().await, before);
        assert!(sink.published.lock().await.is_empty());
        assert_eq!(pipeline.applied_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_broadcast_versions_are_unique() {
        let (pipeline, sink) = create_test_pipeline(5);
        let pipeline = Arc::new(pipeline);

        let mut handles = Vec::new();
        for task in 0..4 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                let channel = if task % 2 == 0 { "temperature" } else { "humidity" };
                for i in 0..25 {
                    pipeline.apply(channel, i as f64, Some(i)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut versions: Vec<u64> = sink
            .published
            .lock()
            .await
            .iter()
            .map(|s| s.version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=100).collect::<Vec<u64>>());

        let history = pipeline.store().history().await;
        assert_eq!(history["temperature"].len(), 5);
        assert_eq!(history["humidity"].len(), 5);
    }
}
