//! Sensor Store
//!
//! Single owner of the History Store and Live State Cache. Both live behind
//! one Tokio `RwLock`, so an apply (append + live update + snapshot build) is
//! atomic with respect to other applies and to every read.
//!
//! Nothing outside this type can reach the internal containers; every read
//! returns an owned copy taken under the lock.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::error::{StoreError, StoreResult};
use crate::store::history::HistoryStore;
use crate::store::live::LiveState;
use crate::store::types::{CurrentReadings, HistoryMap, Reading, Snapshot};

/// State guarded by the store lock
#[derive(Debug)]
struct StoreInner {
    history: HistoryStore,
    live: LiveState,
    /// Bumped on every applied reading
    version: u64,
}

impl StoreInner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            current: self.live.snapshot(),
            history: self.history.to_map(),
        }
    }
}

/// Thread-safe owner of all sensor state
#[derive(Debug)]
pub struct SensorStore {
    inner: RwLock<StoreInner>,
    /// Configured channels, in configuration order
    channels: Vec<String>,
}

impl SensorStore {
    /// Empty store: no history, every channel unset, `last_update` null
    pub fn new<S: AsRef<str>>(channels: &[S], max_history: usize) -> Self {
        let history = HistoryStore::new(channels, max_history);
        let live = LiveState::new(channels);
        Self::from_parts(channels, history, live)
    }

    /// Store pre-filled with `history`; live values are derived from it
    pub fn with_history<S: AsRef<str>>(
        channels: &[S],
        history: HistoryStore,
        last_update: Option<i64>,
    ) -> Self {
        let live = LiveState::from_history(&history, last_update);
        Self::from_parts(channels, history, live)
    }

    fn from_parts<S: AsRef<str>>(channels: &[S], history: HistoryStore, live: LiveState) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                history,
                live,
                version: 0,
            }),
            channels: channels.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Apply a reading and return the resulting snapshot
    ///
    /// The snapshot is built inside the critical section, so it reflects
    /// exactly this apply and every apply before it.
    pub async fn apply(&self, channel: &str, reading: Reading) -> StoreResult<Arc<Snapshot>> {
        if !self.is_known(channel) {
            return Err(StoreError::UnknownChannel(channel.to_string()));
        }

        let mut inner = self.inner.write().await;
        inner.history.append(channel, reading)?;
        inner.live.update(channel, &reading)?;
        inner.version += 1;

        Ok(Arc::new(inner.snapshot()))
    }

    /// Consistent copy of current values and history
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::new(self.inner.read().await.snapshot())
    }

    /// Latest value per channel and `last_update`
    pub async fn current(&self) -> CurrentReadings {
        self.inner.read().await.live.snapshot()
    }

    /// Every channel's history, oldest first
    pub async fn history(&self) -> HistoryMap {
        self.inner.read().await.history.to_map()
    }

    /// One channel's history, oldest first
    pub async fn channel_history(&self, channel: &str) -> StoreResult<Vec<Reading>> {
        self.inner.read().await.history.get(channel)
    }

    /// Number of readings applied since startup
    pub async fn version(&self) -> u64 {
        self.inner.read().await.version
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn is_known(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}
