//! Store error types

use thiserror::Error;

/// Errors that can occur when applying or querying readings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Channel is not part of the configured channel set
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// NaN and infinities parse as numbers but cannot be charted or serialized
    #[error("Value for channel {channel} is not finite: {value}")]
    NonFiniteValue { channel: String, value: f64 },
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::UnknownChannel("pressure".to_string());
        assert_eq!(err.to_string(), "Unknown channel: pressure");

        let err = StoreError::NonFiniteValue {
            channel: "temperature".to_string(),
            value: f64::INFINITY,
        };
        assert_eq!(
            err.to_string(),
            "Value for channel temperature is not finite: inf"
        );
    }
}
