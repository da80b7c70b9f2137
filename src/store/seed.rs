//! Synthetic history used to pre-fill charts at startup

use rand::Rng;
use std::collections::BTreeSet;

use crate::store::history::HistoryStore;
use crate::store::types::Reading;

/// Spacing between seeded readings in milliseconds
pub const SEED_INTERVAL_MS: i64 = 2000;

/// Value range for one channel's seeded readings
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRange {
    pub channel: String,
    pub min: f64,
    pub max: f64,
}

/// Fill every channel with `capacity` readings spaced [`SEED_INTERVAL_MS`]
/// apart, the newest one interval before `now_ms`
///
/// Values are uniform in the channel's range, rounded to one decimal.
pub fn seed_history<R: Rng>(
    ranges: &[SeedRange],
    capacity: usize,
    now_ms: i64,
    rng: &mut R,
) -> HistoryStore {
    let channels: Vec<&str> = ranges.iter().map(|r| r.channel.as_str()).collect();
    let mut history = HistoryStore::new(channels.as_slice(), capacity);
    let capacity = history.capacity();

    let mut seeded = BTreeSet::new();
    for range in ranges {
        // First range wins for a repeated channel
        if !seeded.insert(range.channel.as_str()) {
            continue;
        }

        let (lo, hi) = if range.min <= range.max {
            (range.min, range.max)
        } else {
            (range.max, range.min)
        };

        for i in (1..=capacity as i64).rev() {
            let value = (rng.gen_range(lo..=hi) * 10.0).round() / 10.0;
            let reading = Reading::with_timestamp(value, now_ms - i * SEED_INTERVAL_MS);
            let appended = history.append(&range.channel, reading);
            debug_assert!(appended.is_ok(), "store built from the same ranges");
        }
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ranges() -> Vec<SeedRange> {
        vec![
            SeedRange {
                channel: "temperature".to_string(),
                min: 20.0,
                max: 30.0,
            },
            SeedRange {
                channel: "humidity".to_string(),
                min: 40.0,
                max: 80.0,
            },
        ]
    }

    #[test]
    fn test_seed_fills_to_capacity() {
        let mut rng = StdRng::seed_from_u64(42);
        let history = seed_history(&ranges(), 30, 1_000_000, &mut rng);

        assert_eq!(history.len("temperature"), 30);
        assert_eq!(history.len("humidity"), 30);
    }

    #[test]
    fn test_seed_values_in_range_and_rounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = seed_history(&ranges(), 30, 1_000_000, &mut rng);

        for r in history.get("temperature").unwrap() {
            assert!((20.0..=30.0).contains(&r.value));
            assert_eq!((r.value * 10.0).round() / 10.0, r.value);
        }
        for r in history.get("humidity").unwrap() {
            assert!((40.0..=80.0).contains(&r.value));
        }
    }

    #[test]
    fn test_seed_repeated_channel_uses_first_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ranges = ranges();
        ranges.push(SeedRange {
            channel: "temperature".to_string(),
            min: 500.0,
            max: 600.0,
        });
        let history = seed_history(&ranges, 4, 1_000_000, &mut rng);

        let temperature = history.get("temperature").unwrap();
        assert_eq!(temperature.len(), 4);
        assert!(temperature.iter().all(|r| (20.0..=30.0).contains(&r.value)));
        assert_eq!(temperature[0].timestamp, 1_000_000 - 4 * SEED_INTERVAL_MS);
    }

    #[test]
    fn test_seed_timestamps_ascending_before_now() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = 1_000_000;
        let history = seed_history(&ranges(), 5, now, &mut rng);

        let timestamps: Vec<i64> = history
            .get("temperature")
            .unwrap()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(
            timestamps,
            vec![now - 10_000, now - 8_000, now - 6_000, now - 4_000, now - 2_000]
        );
    }
}
