//! Sensor State Store
//!
//! In-memory state shared by ingestion, fan-out and the pull API:
//!
//! - **types**: `Reading`, `CurrentReadings`, `HistoryMap`, `Snapshot`
//! - **history**: bounded per-channel FIFO of readings
//! - **live**: latest value per channel + global `last_update`
//! - **engine**: `SensorStore`, the lock-guarded owner of both
//! - **seed**: synthetic history for pre-filled charts
//! - **error**: error types
//!
//! # Example
//!
//! ```rust,no_run
//! use sensor_relay::store::{Reading, SensorStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SensorStore::new(&["temperature", "humidity"], 30);
//!     store.apply("temperature", Reading::now(21.5)).await?;
//!
//!     let current = store.current().await;
//!     assert_eq!(current.value("temperature"), Some(21.5));
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod history;
pub mod live;
pub mod seed;
pub mod types;

pub use engine::SensorStore;
pub use error::{StoreError, StoreResult};
pub use history::HistoryStore;
pub use live::LiveState;
pub use seed::{seed_history, SeedRange, SEED_INTERVAL_MS};
pub use types::{CurrentReadings, HistoryMap, Reading, Snapshot, RESERVED_KEYS};
