//! MQTT Event Source
//!
//! Drives the rumqttc event loop and turns every PUBLISH into an
//! [`InboundMessage`] on an mpsc channel. Reconnection is rumqttc's: polling
//! again after an error reconnects. Sessions are clean, so every CONNACK is
//! followed by one SUBSCRIBE covering all channel topics.

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::IngestError;
use crate::config::MqttConfig;

/// One message received from the bus
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Broker connectivity, shared with the health endpoint
#[derive(Debug, Default)]
pub struct BusStatus {
    connected: AtomicBool,
}

impl BusStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}

/// Build client options from configuration
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    options.set_clean_session(true);
    options
}

/// Subscribes to the channel topics and forwards publishes
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
    status: Arc<BusStatus>,
    broker: String,
    port: u16,
    reconnect_delay: Duration,
}

impl MqttSource {
    pub fn new(config: &MqttConfig, topics: Vec<String>, status: Arc<BusStatus>) -> Self {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), config.event_capacity);

        Self {
            client,
            eventloop,
            topics,
            status,
            broker: config.broker.clone(),
            port: config.port,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }

    /// Run the event loop on its own task until the receiver is dropped
    pub fn spawn(self, tx: mpsc::Sender<InboundMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    async fn run(mut self, tx: mpsc::Sender<InboundMessage>) {
        let (host, port) = (self.broker.clone(), self.port);
        tracing::info!(broker = %host, port, "Connecting to MQTT broker");

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.status.set_connected(true);
                    tracing::info!(broker = %host, port, "Connected to MQTT broker");
                    self.subscribe_all();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                    if tx.send(message).await.is_err() {
                        tracing::debug!("Ingestion receiver dropped, stopping MQTT source");
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.status.set_connected(false);
                    tracing::warn!("Broker closed the MQTT session");
                }
                Ok(_) => {}
                Err(e) => {
                    let was_connected = self.status.is_connected();
                    self.status.set_connected(false);
                    let err = IngestError::BusConnect(e.to_string());
                    if was_connected {
                        tracing::warn!(error = %err, "Lost connection to MQTT broker");
                    } else {
                        tracing::warn!(broker = %host, port, error = %err, "MQTT connect failed");
                    }
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }

        self.status.set_connected(false);
    }

    fn subscribe_all(&self) {
        let filters = self
            .topics
            .iter()
            .map(|t| SubscribeFilter::new(t.clone(), QoS::AtMostOnce));

        match self.client.try_subscribe_many(filters) {
            Ok(()) => tracing::info!(topics = ?self.topics, "Subscribed to sensor topics"),
            Err(e) => tracing::error!(error = %e, "Failed to queue subscription"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn test_config() -> MqttConfig {
        MqttConfig {
            // Nothing listens on port 1 on loopback
            broker: "127.0.0.1".to_string(),
            port: 1,
            reconnect_delay_ms: 10,
            ..MqttConfig::default()
        }
    }

    #[test]
    fn test_mqtt_options_from_config() {
        let config = MqttConfig::default();
        let options = mqtt_options(&config);

        assert_eq!(options.broker_address(), ("127.0.0.1".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert_eq!(options.client_id(), "sensor-relay");
    }

    #[test]
    fn test_bus_status_starts_disconnected() {
        let status = BusStatus::new();
        assert!(!status.is_connected());
        status.set_connected(true);
        assert!(status.is_connected());
    }

    /// Read one MQTT packet: fixed header byte and body
    async fn read_packet(stream: &mut TcpStream) -> (u8, Vec<u8>) {
        let header = stream.read_u8().await.unwrap();
        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let byte = stream.read_u8().await.unwrap();
            len |= ((byte & 0x7f) as usize) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await.unwrap();
        (header, body)
    }

    /// Accept one session: CONNECT → CONNACK, then return the next packet
    async fn accept_session(listener: &TcpListener) -> (TcpStream, u8, Vec<u8>) {
        let (mut stream, _) = listener.accept().await.unwrap();

        let (header, _) = read_packet(&mut stream).await;
        assert_eq!(header & 0xf0, 0x10, "expected CONNECT");
        stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

        let (header, body) = read_packet(&mut stream).await;
        (stream, header, body)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[tokio::test]
    async fn test_subscribes_after_every_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = MqttConfig {
            broker: "127.0.0.1".to_string(),
            port,
            reconnect_delay_ms: 10,
            ..MqttConfig::default()
        };
        let topics = vec![
            "iot/sensor/humidity".to_string(),
            "iot/sensor/temperature".to_string(),
        ];
        let status = Arc::new(BusStatus::new());
        let source = MqttSource::new(&config, topics, Arc::clone(&status));
        let (tx, _rx) = mpsc::channel(8);
        let handle = source.spawn(tx);

        let timeout = Duration::from_secs(5);

        // First session
        let (stream, header, body) = tokio::time::timeout(timeout, accept_session(&listener))
            .await
            .unwrap();
        assert_eq!(header & 0xf0, 0x80, "expected SUBSCRIBE");
        assert!(contains(&body, b"iot/sensor/humidity"));
        assert!(contains(&body, b"iot/sensor/temperature"));
        assert!(status.is_connected());

        // Drop the connection; the source reconnects and subscribes again
        drop(stream);

        let (_stream, header, body) = tokio::time::timeout(timeout, accept_session(&listener))
            .await
            .unwrap();
        assert_eq!(header & 0xf0, 0x80, "expected SUBSCRIBE after reconnect");
        assert!(contains(&body, b"iot/sensor/humidity"));
        assert!(contains(&body, b"iot/sensor/temperature"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_unreachable_broker_keeps_retrying() {
        let status = Arc::new(BusStatus::new());
        let source = MqttSource::new(
            &test_config(),
            vec!["iot/sensor/temperature".to_string()],
            Arc::clone(&status),
        );
        let (tx, _rx) = mpsc::channel(8);
        let handle = source.spawn(tx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        assert!(!status.is_connected());

        handle.abort();
    }
}
