//! Bounded History Store
//!
//! One FIFO ring per channel holding at most `capacity` readings in arrival
//! order. The channel set is fixed at construction; appends to any other
//! channel are rejected with [`StoreError::UnknownChannel`].

use std::collections::{BTreeMap, VecDeque};

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{HistoryMap, Reading};

/// Per-channel bounded history of readings
#[derive(Debug, Clone)]
pub struct HistoryStore {
    /// Maximum readings kept per channel
    capacity: usize,
    /// Channel name → readings, oldest first
    series: BTreeMap<String, VecDeque<Reading>>,
}

impl HistoryStore {
    /// Create an empty store for the given channels
    ///
    /// A capacity of zero is raised to one.
    pub fn new<S: AsRef<str>>(channels: &[S], capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let series = channels
            .iter()
            .map(|c| (c.as_ref().to_string(), VecDeque::with_capacity(capacity)))
            .collect();

        Self { capacity, series }
    }

    /// Append a reading, evicting from the front while over capacity
    pub fn append(&mut self, channel: &str, reading: Reading) -> StoreResult<()> {
        let series = self
            .series
            .get_mut(channel)
            .ok_or_else(|| StoreError::UnknownChannel(channel.to_string()))?;

        series.push_back(reading);
        while series.len() > self.capacity {
            series.pop_front();
        }
        Ok(())
    }

    /// Copy of a channel's readings, oldest first
    pub fn get(&self, channel: &str) -> StoreResult<Vec<Reading>> {
        self.series
            .get(channel)
            .map(|s| s.iter().copied().collect())
            .ok_or_else(|| StoreError::UnknownChannel(channel.to_string()))
    }

    /// Most recent reading of a channel
    pub fn latest(&self, channel: &str) -> Option<Reading> {
        self.series.get(channel).and_then(|s| s.back().copied())
    }

    /// Copy of every channel's readings
    pub fn to_map(&self) -> HistoryMap {
        self.series
            .iter()
            .map(|(name, s)| (name.clone(), s.iter().copied().collect()))
            .collect()
    }

    pub fn len(&self, channel: &str) -> usize {
        self.series.get(channel).map(VecDeque::len).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.series.contains_key(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}
