//! MQTT transport built on the synchronous `rumqttc` client.
//!
//! The client hands requests to a connection that must be polled
//! continuously; a dedicated thread drives it, logs transport errors and
//! keeps reconnecting until [`Publisher::close`] is called.

use rumqttc::{Client, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::common::constants::*;
use crate::config::MqttSettings;
use crate::error::{DaytimeError, PublishError};
use crate::transport::Publisher;

/// Publisher connected to an MQTT broker.
pub struct MqttPublisher {
    client: Mutex<Client>,
    connected: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    connection_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MqttPublisher {
    /// Connect and wait for the broker to accept the session.
    ///
    /// An unreachable broker or rejected credentials is a configuration error:
    /// the service refuses to start rather than schedule into the void.
    pub fn connect(settings: &MqttSettings, debug_enabled: bool) -> Result<Self, DaytimeError> {
        let mut options = MqttOptions::new(
            settings.client_id.clone(),
            settings.host.clone(),
            settings.port,
        );
        options.set_keep_alive(MQTT_KEEP_ALIVE);
        if let Some(user) = &settings.user {
            options.set_credentials(user.clone(), settings.pass.clone().unwrap_or_default());
        }

        let (client, mut connection) = Client::new(options, MQTT_REQUEST_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let closing = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let thread_connected = Arc::clone(&connected);
        let thread_closing = Arc::clone(&closing);
        let handle = thread::Builder::new()
            .name("mqtt-connection".to_string())
            .spawn(move || {
                let mut ready_tx = Some(ready_tx);
                for notification in connection.iter() {
                    match notification {
                        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                            if ack.code == ConnectReturnCode::Success {
                                thread_connected.store(true, Ordering::SeqCst);
                                match ready_tx.take() {
                                    Some(tx) => {
                                        let _ = tx.send(Ok(()));
                                    }
                                    None => log_decorated!("Reconnected to MQTT broker"),
                                }
                            } else {
                                let reason = format!("broker refused connection: {:?}", ack.code);
                                if let Some(tx) = ready_tx.take() {
                                    let _ = tx.send(Err(reason));
                                    break;
                                }
                                log_error!("{}", reason);
                            }
                        }
                        Ok(event) => {
                            if debug_enabled {
                                log_debug!("MQTT event: {event:?}");
                            }
                        }
                        Err(e) => {
                            thread_connected.store(false, Ordering::SeqCst);
                            if thread_closing.load(Ordering::SeqCst) {
                                break;
                            }
                            if let Some(tx) = ready_tx.take() {
                                let _ = tx.send(Err(e.to_string()));
                                break;
                            }
                            log_pipe!();
                            log_error!("MQTT connection error: {e}");
                            log_indented!(
                                "Retrying in {}s",
                                MQTT_RECONNECT_DELAY.as_secs()
                            );
                            thread::sleep(MQTT_RECONNECT_DELAY);
                        }
                    }
                }
            })
            .map_err(|e| {
                DaytimeError::Configuration(format!("failed to spawn MQTT connection thread: {e}"))
            })?;

        let endpoint = format!("{}:{}", settings.host, settings.port);
        match ready_rx.recv_timeout(MQTT_CONNECT_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                client: Mutex::new(client),
                connected,
                closing,
                connection_thread: Mutex::new(Some(handle)),
            }),
            Ok(Err(reason)) => Err(DaytimeError::Configuration(format!(
                "cannot connect to MQTT broker at {endpoint}: {reason}"
            ))),
            Err(RecvTimeoutError::Timeout) => {
                closing.store(true, Ordering::SeqCst);
                let _ = client.try_disconnect();
                Err(DaytimeError::Configuration(format!(
                    "MQTT broker at {endpoint} did not answer within {}s",
                    MQTT_CONNECT_TIMEOUT.as_secs()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => Err(DaytimeError::Configuration(format!(
                "MQTT connection to {endpoint} ended before it was established"
            ))),
        }
    }

    /// Whether the broker session is currently up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: &[u8], retained: bool) -> Result<(), PublishError> {
        if self.closing.load(Ordering::SeqCst) || !self.is_connected() {
            return Err(PublishError::Disconnected);
        }
        let client = self.client.lock().map_err(|_| PublishError::Disconnected)?;
        // try_publish never blocks on a full request queue, so a stalled
        // broker cannot hold up the scheduler.
        client
            .try_publish(topic, QoS::AtLeastOnce, retained, payload.to_vec())
            .map_err(|e| PublishError::Rejected {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    fn close(&self) -> Result<(), PublishError> {
        self.closing.store(true, Ordering::SeqCst);
        let disconnect = self
            .client
            .lock()
            .map_err(|_| PublishError::Close("client lock poisoned".to_string()))?
            .try_disconnect();

        let handle = self
            .connection_thread
            .lock()
            .map_err(|_| PublishError::Close("connection handle lock poisoned".to_string()))?
            .take();
        if let Some(handle) = handle {
            let deadline = Instant::now() + MQTT_CLOSE_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
        self.connected.store(false, Ordering::SeqCst);

        disconnect.map_err(|e| PublishError::Close(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::Connection;

    fn settings(port: u16) -> MqttSettings {
        MqttSettings {
            host: "127.0.0.1".to_string(),
            port,
            user: None,
            pass: None,
            client_id: "daytime-test".to_string(),
        }
    }

    /// Publisher whose session never came up. The connection is returned so
    /// the request queue stays open.
    fn unconnected() -> (MqttPublisher, Connection) {
        let options = MqttOptions::new("daytime-test", "127.0.0.1", 1);
        let (client, connection) = Client::new(options, MQTT_REQUEST_CAPACITY);
        let publisher = MqttPublisher {
            client: Mutex::new(client),
            connected: Arc::new(AtomicBool::new(true)),
            closing: Arc::new(AtomicBool::new(false)),
            connection_thread: Mutex::new(None),
        };
        (publisher, connection)
    }

    #[test]
    fn test_connect_to_closed_port_is_configuration_error() {
        // Nothing listens on port 1, so the refusal arrives well before the timeout
        let started = Instant::now();
        match MqttPublisher::connect(&settings(1), false) {
            Err(DaytimeError::Configuration(message)) => {
                assert!(message.contains("127.0.0.1:1"), "message: {message}");
            }
            Err(other) => panic!("expected a configuration error, got {other:?}"),
            Ok(_) => panic!("connected to a closed port"),
        }
        assert!(started.elapsed() < MQTT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_publish_while_closing_is_disconnected() {
        let (publisher, _connection) = unconnected();
        publisher.closing.store(true, Ordering::SeqCst);

        assert_eq!(
            publisher.publish(TOPIC_STATUS, b"Daytime", true),
            Err(PublishError::Disconnected)
        );
    }

    #[test]
    fn test_publish_after_close_is_disconnected() {
        let (publisher, _connection) = unconnected();
        publisher.close().unwrap();

        assert!(!publisher.is_connected());
        assert_eq!(
            publisher.publish(TOPIC_STATUS, b"Nighttime", true),
            Err(PublishError::Disconnected)
        );
    }

    #[test]
    fn test_publish_without_session_is_disconnected() {
        let (publisher, _connection) = unconnected();
        publisher.connected.store(false, Ordering::SeqCst);

        assert_eq!(
            publisher.publish(TOPIC_NEXT_STATUS, b"Daytime", true),
            Err(PublishError::Disconnected)
        );
    }
}
