//! Ingestion error types
//!
//! None of these are fatal: the adapter logs them and moves on.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Connection to the broker failed or was lost
    #[error("Bus connect failure: {0}")]
    BusConnect(String),

    /// Payload is not the text of a number
    #[error("Payload is not a number: {0:?}")]
    PayloadDecode(String),

    /// Topic does not belong to any configured channel
    #[error("No channel for topic: {0}")]
    UnknownChannel(String),

    /// The store rejected the reading
    #[error("Store rejected reading: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for ingestion
pub type IngestResult<T> = Result<T, IngestError>;
