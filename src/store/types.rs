//! Core data types for the sensor store
//!
//! - `Reading`: a single timestamped measurement
//! - `CurrentReadings`: latest value per channel plus the global `last_update`
//! - `HistoryMap`: ordered readings per channel, oldest first
//! - `Snapshot`: everything a dashboard needs, pushed on update and on connect

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot keys that live next to the flattened per-channel values.
/// Channel names must not collide with these.
pub const RESERVED_KEYS: &[&str] = &["last_update", "history"];

/// A single timestamped sensor observation
///
/// Immutable once created. Serialized as `{"timestamp": ms, "value": f64}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// The measured value
    pub value: f64,
}

impl Reading {
    /// Create a reading stamped with the current wall-clock time
    pub fn now(value: f64) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            value,
        }
    }

    /// Create a reading with a specific timestamp
    pub fn with_timestamp(value: f64, timestamp: i64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered readings per channel, oldest first
pub type HistoryMap = BTreeMap<String, Vec<Reading>>;

/// Latest value of every channel and the time of the most recent update
///
/// Channels that have not received a reading yet are present with `None`,
/// which serializes as `null`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CurrentReadings {
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
    pub last_update: Option<i64>,
}

impl CurrentReadings {
    /// Current value of a channel, `None` if unset or unknown
    pub fn value(&self, channel: &str) -> Option<f64> {
        self.values.get(channel).copied().flatten()
    }
}

/// Full state pushed to real-time clients
///
/// `version` increases by one with every applied reading. It orders
/// snapshots per connection and is not part of the wire format.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Snapshot {
    #[serde(skip)]
    pub version: u64,
    #[serde(flatten)]
    pub current: CurrentReadings,
    pub history: HistoryMap,
}

impl Snapshot {
    /// History of a single channel (empty if unknown)
    pub fn history_of(&self, channel: &str) -> &[Reading] {
        self.history.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }
}
