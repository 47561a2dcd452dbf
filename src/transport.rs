//! The publish/subscribe transport a publisher hands its bytes to.

use crate::error::{Error, Result};
use crate::publisher::PublisherConfig;
use log::{debug, info, trace, warn};
use rumqttc::{Client, Connection, ConnectionError, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use url::{Host, Url};

/// Default MQTT port when the broker URL does not give one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Capacity of the request queue between the client and its event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Pause between reconnect attempts after the connection drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Anything that can carry serialized Sparkplug payloads to a broker.
///
/// Errors are reported as-is; retrying is up to the implementation.
pub trait Transport {
    /// Establishes the connection.
    fn connect(&mut self) -> Result<()>;

    /// Publishes `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Closes the connection.
    fn disconnect(&mut self) -> Result<()>;
}

/// An MQTT [`Transport`] built on the rumqttc synchronous client.
///
/// The rumqttc event loop runs on a background thread from `connect()` until
/// `disconnect()`. `connect()` returns once the broker has acknowledged the
/// session or the configured timeout has passed.
pub struct MqttTransport {
    options: MqttOptions,
    qos: QoS,
    connect_timeout: Duration,
    client: Option<Client>,
    event_loop: Option<JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
}

impl MqttTransport {
    /// Creates an unconnected transport from the publisher configuration.
    pub fn new(config: &PublisherConfig) -> Result<Self> {
        let (host, port) = parse_broker_url(&config.broker_url)?;
        let mut options = MqttOptions::new(config.client_id.clone(), host, port);
        options.set_keep_alive(config.keep_alive);
        if let Some(credentials) = &config.credentials {
            options.set_credentials(credentials.username.clone(), credentials.password.clone());
        }

        Ok(Self {
            options,
            qos: config.qos,
            connect_timeout: config.connect_timeout,
            client: None,
            event_loop: None,
            stopping: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true between a successful `connect()` and `disconnect()`.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

impl Transport for MqttTransport {
    fn connect(&mut self) -> Result<()> {
        if self.client.is_some() {
            warn!("connect() called on an already connected transport");
            return Ok(());
        }

        let (client, connection) = Client::new(self.options.clone(), REQUEST_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = mpsc::channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let loop_stopping = Arc::clone(&stopping);

        let handle = thread::Builder::new()
            .name("sparkplug-mqtt".to_string())
            .spawn(move || drive_event_loop(connection, ready_tx, loop_stopping))
            .map_err(|e| Error::ConnectionFailed(format!("cannot start event loop: {}", e)))?;

        match ready_rx.recv_timeout(self.connect_timeout) {
            Ok(Ok(())) => {
                self.client = Some(client);
                self.event_loop = Some(handle);
                self.stopping = stopping;
                Ok(())
            }
            Ok(Err(details)) => Err(Error::ConnectionFailed(details)),
            Err(_) => {
                stopping.store(true, Ordering::SeqCst);
                Err(Error::ConnectionFailed(format!(
                    "no CONNACK within {:?}",
                    self.connect_timeout
                )))
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let client = self.client.as_mut().ok_or(Error::NotConnected)?;
        client.publish(topic, self.qos, false, payload.to_vec())?;
        trace!("Queued {} bytes for {}", payload.len(), topic);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        self.stopping.store(true, Ordering::SeqCst);
        let result = client.disconnect();
        if let Err(e) = &result {
            warn!("MQTT disconnect request failed: {}", e);
        }
        // Dropping the last client ends the request stream, so the loop exits
        // even when the disconnect request never reached it.
        drop(client);

        if let Some(handle) = self.event_loop.take() {
            if handle.join().is_err() {
                warn!("MQTT event loop thread panicked");
            }
        }
        result?;
        info!("Disconnected from MQTT broker");
        Ok(())
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if self.client.is_some() {
            if let Err(e) = self.disconnect() {
                warn!("Disconnect on drop failed: {}", e);
            }
        }
    }
}

fn drive_event_loop(
    mut connection: Connection,
    ready: mpsc::Sender<std::result::Result<(), String>>,
    stopping: Arc<AtomicBool>,
) {
    let mut ready = Some(ready);
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!("Connected to MQTT broker ({:?})", ack.code);
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(event) => trace!("MQTT event: {:?}", event),
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(e.to_string()));
                    break;
                }
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                warn!("Connection lost: {}", e);
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }
    debug!("MQTT event loop stopped");
}

/// Splits `tcp://host:port`, `mqtt://host:port` or `host[:port]` into host
/// and port. IPv6 hosts come back without brackets. Credentials go in
/// [`PublisherConfig::with_credentials`], so a URL carrying userinfo is
/// rejected; any path is ignored.
pub fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let invalid = |reason: String| Error::InvalidConfig(format!("broker URL '{}': {}", url, reason));

    let parsed = if url.contains("://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("tcp://{}", url))
    }
    .map_err(|e| invalid(e.to_string()))?;

    match parsed.scheme() {
        "tcp" | "mqtt" => {}
        scheme => return Err(invalid(format!("unsupported scheme '{}'", scheme))),
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials must be set on the config, not the URL".to_string()));
    }

    let host = match parsed.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(invalid("no host".to_string())),
    };
    Ok((host, parsed.port().unwrap_or(DEFAULT_MQTT_PORT)))
}
