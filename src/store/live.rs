//! Live State Cache
//!
//! Latest value per channel plus one global `last_update`. The timestamp is
//! overwritten on every update in arrival order, even when it moves
//! backwards; there is no clock-skew reconciliation across channels.

use std::collections::BTreeMap;

use crate::store::error::{StoreError, StoreResult};
use crate::store::history::HistoryStore;
use crate::store::types::{CurrentReadings, Reading};

#[derive(Debug, Clone)]
pub struct LiveState {
    values: BTreeMap<String, Option<f64>>,
    last_update: Option<i64>,
}

impl LiveState {
    /// Unset state for the given channels
    pub fn new<S: AsRef<str>>(channels: &[S]) -> Self {
        Self {
            values: channels
                .iter()
                .map(|c| (c.as_ref().to_string(), None))
                .collect(),
            last_update: None,
        }
    }

    /// Derive the state from the newest reading of each channel in `history`
    pub fn from_history(history: &HistoryStore, last_update: Option<i64>) -> Self {
        Self {
            values: history
                .channels()
                .map(|c| (c.to_string(), history.latest(c).map(|r| r.value)))
                .collect(),
            last_update,
        }
    }

    /// Set a channel's value and advance `last_update` unconditionally
    pub fn update(&mut self, channel: &str, reading: &Reading) -> StoreResult<()> {
        let slot = self
            .values
            .get_mut(channel)
            .ok_or_else(|| StoreError::UnknownChannel(channel.to_string()))?;

        *slot = Some(reading.value);
        self.last_update = Some(reading.timestamp);
        Ok(())
    }

    pub fn snapshot(&self) -> CurrentReadings {
        CurrentReadings {
            values: self.values.clone(),
            last_update: self.last_update,
        }
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initially_unset() {
        let live = LiveState::new(&["temperature", "humidity"]);
        let current = live.snapshot();
        assert_eq!(current.values.len(), 2);
        assert_eq!(current.value("temperature"), None);
        assert_eq!(current.last_update, None);
    }

    #[test]
    fn test_last_update_follows_any_channel() {
        let mut live = LiveState::new(&["temperature", "humidity"]);
        live.update("temperature", &Reading::with_timestamp(20.0, 100))
            .unwrap();
        live.update("humidity", &Reading::with_timestamp(55.0, 200))
            .unwrap();

        let current = live.snapshot();
        assert_eq!(current.value("temperature"), Some(20.0));
        assert_eq!(current.value("humidity"), Some(55.0));
        assert_eq!(current.last_update, Some(200));
    }

    #[test]
    fn test_last_update_moves_backwards() {
        let mut live = LiveState::new(&["temperature"]);
        live.update("temperature", &Reading::with_timestamp(20.0, 500))
            .unwrap();
        live.update("temperature", &Reading::with_timestamp(21.0, 300))
            .unwrap();

        assert_eq!(live.last_update(), Some(300));
        assert_eq!(live.snapshot().value("temperature"), Some(21.0));
    }

    #[test]
    fn test_unknown_channel_leaves_state_untouched() {
        let mut live = LiveState::new(&["temperature"]);
        let result = live.update("pressure", &Reading::with_timestamp(1.0, 10));
        assert!(matches!(result, Err(StoreError::UnknownChannel(_))));
        assert_eq!(live.last_update(), None);
    }

    #[test]
    fn test_from_history() {
        let mut history = HistoryStore::new(&["temperature", "humidity"], 3);
        history
            .append("temperature", Reading::with_timestamp(20.0, 1))
            .unwrap();
        history
            .append("temperature", Reading::with_timestamp(24.5, 2))
            .unwrap();

        let live = LiveState::from_history(&history, Some(99));
        let current = live.snapshot();
        assert_eq!(current.value("temperature"), Some(24.5));
        assert_eq!(current.value("humidity"), None);
        assert_eq!(current.last_update, Some(99));
    }
}
