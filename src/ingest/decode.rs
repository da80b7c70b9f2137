//! Payload decoding and topic routing

use std::collections::HashMap;

use super::error::{IngestError, IngestResult};

/// Decode a payload carrying the UTF-8 text of a decimal number
///
/// Surrounding whitespace is ignored. Anything else, including invalid
/// UTF-8, is a [`IngestError::PayloadDecode`].
pub fn decode_payload(payload: &[u8]) -> IngestResult<f64> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| IngestError::PayloadDecode(String::from_utf8_lossy(payload).into_owned()))?;

    text.trim()
        .parse::<f64>()
        .map_err(|_| IngestError::PayloadDecode(text.to_string()))
}

/// Maps bus topics to channel names: `<prefix><channel>`
#[derive(Debug, Clone)]
pub struct TopicMap {
    /// Topic → channel
    routes: HashMap<String, String>,
}

impl TopicMap {
    pub fn new<S: AsRef<str>>(prefix: &str, channels: &[S]) -> Self {
        let routes = channels
            .iter()
            .map(|c| (format!("{}{}", prefix, c.as_ref()), c.as_ref().to_string()))
            .collect();
        Self { routes }
    }

    /// Channel for an inbound topic
    pub fn channel_for(&self, topic: &str) -> IngestResult<&str> {
        self.routes
            .get(topic)
            .map(String::as_str)
            .ok_or_else(|| IngestError::UnknownChannel(topic.to_string()))
    }

    /// Every topic to subscribe to, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.routes.keys().cloned().collect();
        topics.sort();
        topics
    }
}
