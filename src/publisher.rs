//! Sparkplug Publisher for publishing node and device data.

use crate::error::{Error, Result};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::metric::Metric;
use crate::sequencer::{PayloadSequencer, SequencedPayload};
use crate::topic::{MessageType, NodeIdentity, TopicBuilder};
use crate::transport::{MqttTransport, Transport};
use crate::types::now_millis;
use log::{debug, info, warn};
use rumqttc::QoS;
use std::collections::BTreeMap;
use std::time::Duration;

/// Username and password presented to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// MQTT username.
    pub username: String,
    /// MQTT password.
    pub password: String,
}

/// Configuration for a Sparkplug Publisher.
///
/// Every field is public; the `with_*` setters are shorthands for chaining.
/// The values are fixed once a [`Publisher`] has been built from them.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// MQTT broker URL (e.g., "tcp://localhost:1883").
    pub broker_url: String,
    /// Unique MQTT client identifier.
    pub client_id: String,
    /// Sparkplug group ID.
    pub group_id: String,
    /// Edge node identifier.
    pub edge_node_id: String,
    /// Default device for the device-level topic shortcuts.
    pub device_id: Option<String>,
    /// Host application whose STATE topic belongs to this node.
    pub scada_host_id: String,
    /// Broker credentials, if the broker requires them.
    pub credentials: Option<ClientCredentials>,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// QoS used for every publish.
    pub qos: QoS,
    /// How long `connect()` waits for the broker to acknowledge.
    pub connect_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            broker_url: "tcp://localhost:1883".to_string(),
            client_id: "sparkplug-edge-publisher".to_string(),
            group_id: "Sparkplug B Devices".to_string(),
            edge_node_id: "Node-001".to_string(),
            device_id: Some("Device-001".to_string()),
            scada_host_id: "scada-host-1".to_string(),
            credentials: None,
            keep_alive: Duration::from_secs(60),
            qos: QoS::AtMostOnce,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl PublisherConfig {
    /// Creates a new publisher configuration.
    ///
    /// Fields not given here take their [`Default`] values, except the
    /// device, which is left unset.
    pub fn new(
        broker_url: impl Into<String>,
        client_id: impl Into<String>,
        group_id: impl Into<String>,
        edge_node_id: impl Into<String>,
    ) -> Self {
        Self {
            broker_url: broker_url.into(),
            client_id: client_id.into(),
            group_id: group_id.into(),
            edge_node_id: edge_node_id.into(),
            device_id: None,
            ..Self::default()
        }
    }

    /// Sets the default device.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the SCADA host ID.
    pub fn with_scada_host_id(mut self, scada_host_id: impl Into<String>) -> Self {
        self.scada_host_id = scada_host_id.into();
        self
    }

    /// Sets broker credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(ClientCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the keep-alive interval.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the publish QoS.
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// The node identity these settings describe.
    pub fn identity(&self) -> NodeIdentity {
        let identity = NodeIdentity::new(
            self.group_id.clone(),
            self.edge_node_id.clone(),
            self.scada_host_id.clone(),
        );
        match &self.device_id {
            Some(device_id) => identity.with_device_id(device_id.clone()),
            None => identity,
        }
    }

    /// Checks that the identity fields are usable in topics.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("client_id", &self.client_id),
            ("group_id", &self.group_id),
            ("edge_node_id", &self.edge_node_id),
            ("scada_host_id", &self.scada_host_id),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(Error::InvalidConfig(format!("{} must not be empty", field)));
            }
        }
        if self.device_id.as_deref() == Some("") {
            return Err(Error::InvalidConfig(
                "device_id must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// A Sparkplug Publisher for edge nodes.
///
/// The Publisher handles the complete lifecycle of a Sparkplug edge node:
/// - NBIRTH before any NDATA, DBIRTH before any DDATA for that device
/// - NDATA / DDATA updates
/// - NDEATH exactly once, explicitly or on `disconnect()`
/// - Sequence number management
///
/// Every message is checked against the node and device lifecycle before a
/// sequence number is taken, so an out-of-order call leaves the sequence
/// untouched. Once a payload is built its number is spent, whether or not
/// the transport manages to deliver it.
///
/// # Example
///
/// ```no_run
/// use sparkplug_edge::{Metric, Publisher, PublisherConfig};
///
/// let config = PublisherConfig::new(
///     "tcp://localhost:1883",
///     "my_publisher",
///     "Energy",
///     "Gateway01"
/// );
///
/// let mut publisher = Publisher::with_mqtt(config)?;
/// publisher.connect()?;
///
/// publisher.publish_birth(vec![Metric::new("Temperature", 20.5).with_alias(1)])?;
/// publisher.publish_data(vec![Metric::by_alias(1, 21.0)])?;
///
/// publisher.disconnect()?;
/// # Ok::<(), sparkplug_edge::Error>(())
/// ```
pub struct Publisher<T: Transport = MqttTransport> {
    sequencer: PayloadSequencer,
    topics: TopicBuilder,
    lifecycle: Lifecycle,
    transport: T,
    birth_metrics: Option<Vec<Metric>>,
    device_births: BTreeMap<String, Vec<Metric>>,
}

impl Publisher<MqttTransport> {
    /// Creates a publisher that talks MQTT to the configured broker.
    pub fn with_mqtt(config: PublisherConfig) -> Result<Self> {
        let transport = MqttTransport::new(&config)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> Publisher<T> {
    /// Creates a new Publisher over an arbitrary transport.
    pub fn new(config: PublisherConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sequencer: PayloadSequencer::new(),
            topics: TopicBuilder::new(config.identity()),
            lifecycle: Lifecycle::new(),
            transport,
            birth_metrics: None,
            device_births: BTreeMap::new(),
        })
    }

    /// Connects the transport.
    pub fn connect(&mut self) -> Result<()> {
        self.transport.connect()?;
        info!(
            "Edge node {}/{} connected",
            self.topics.identity().group_id,
            self.topics.identity().edge_node_id
        );
        Ok(())
    }

    /// Disconnects the transport.
    ///
    /// If the node is still alive, NDEATH is published first. A failed
    /// NDEATH is logged and does not prevent the disconnect.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.lifecycle.node_state().is_alive() {
            if let Err(e) = self.publish_death() {
                warn!("NDEATH before disconnect failed: {}", e);
            }
        }
        self.transport.disconnect()
    }

    /// Publishes an NBIRTH (Node Birth) message.
    ///
    /// The metrics should carry both names and aliases. They are kept so
    /// [`Publisher::rebirth`] can announce the node again. Returns the wire
    /// sequence number used.
    pub fn publish_birth(&mut self, metrics: Vec<Metric>) -> Result<u64> {
        let kept = metrics.clone();
        let seq = self.publish(MessageType::NBirth, None, metrics)?;
        self.birth_metrics = Some(kept);
        Ok(seq)
    }

    /// Publishes the last NBIRTH again, followed by a DBIRTH for every device
    /// that was alive, all with fresh timestamps.
    ///
    /// This is typically called in response to a rebirth request. Returns the
    /// wire sequence number of the NBIRTH.
    pub fn rebirth(&mut self) -> Result<u64> {
        let metrics = match &self.birth_metrics {
            Some(metrics) => restamp(metrics),
            None => {
                return Err(Error::LifecycleViolation {
                    message_type: MessageType::NBirth,
                    scope: "node".to_string(),
                    state: self.lifecycle.node_state(),
                })
            }
        };
        let devices: Vec<(String, Vec<Metric>)> = self
            .device_births
            .iter()
            .filter(|(id, _)| self.lifecycle.device_state(id).is_alive())
            .map(|(id, metrics)| (id.clone(), restamp(metrics)))
            .collect();

        info!("Rebirth requested, re-announcing {} device(s)", devices.len());
        let seq = self.publish_birth(metrics)?;
        for (index, (device_id, metrics)) in devices.iter().enumerate() {
            if let Err(e) = self.publish_device_birth(device_id, metrics.clone()) {
                let skipped: Vec<&str> = devices[index..].iter().map(|(id, _)| id.as_str()).collect();
                warn!(
                    "Rebirth stopped at DBIRTH for {}; not re-announced: {}",
                    device_id,
                    skipped.join(", ")
                );
                return Err(e);
            }
        }
        Ok(seq)
    }

    /// Publishes an NDATA (Node Data) message.
    ///
    /// The metrics should typically use aliases only for bandwidth efficiency.
    pub fn publish_data(&mut self, metrics: Vec<Metric>) -> Result<u64> {
        self.publish(MessageType::NData, None, metrics)
    }

    /// Publishes an NDEATH (Node Death) message.
    ///
    /// Its sequence number continues the node's series. After this call the
    /// node is dead whether or not the transport accepted the message.
    pub fn publish_death(&mut self) -> Result<u64> {
        self.publish(MessageType::NDeath, None, Vec::new())
    }

    /// Publishes a DBIRTH (Device Birth) message for a device.
    ///
    /// Must call publish_birth() before publishing any device births.
    pub fn publish_device_birth(&mut self, device_id: &str, metrics: Vec<Metric>) -> Result<u64> {
        let kept = metrics.clone();
        let seq = self.publish(MessageType::DBirth, Some(device_id), metrics)?;
        self.device_births.insert(device_id.to_string(), kept);
        Ok(seq)
    }

    /// Publishes a DDATA (Device Data) message for a device.
    ///
    /// Must call publish_device_birth() before the first publish_device_data().
    pub fn publish_device_data(&mut self, device_id: &str, metrics: Vec<Metric>) -> Result<u64> {
        self.publish(MessageType::DData, Some(device_id), metrics)
    }

    /// Publishes a DDEATH (Device Death) message for a device.
    pub fn publish_device_death(&mut self, device_id: &str) -> Result<u64> {
        self.publish(MessageType::DDeath, Some(device_id), Vec::new())
    }

    /// Gets the wire sequence number (0-255) of the most recent payload.
    pub fn seq(&self) -> u64 {
        self.sequencer.seq()
    }

    /// Gets the number of payloads built so far.
    pub fn counter(&self) -> u64 {
        self.sequencer.counter()
    }

    /// Lifecycle state of the node.
    pub fn node_state(&self) -> LifecycleState {
        self.lifecycle.node_state()
    }

    /// Lifecycle state of a device.
    pub fn device_state(&self, device_id: &str) -> LifecycleState {
        self.lifecycle.device_state(device_id)
    }

    /// The topic builder for this node.
    pub fn topics(&self) -> &TopicBuilder {
        &self.topics
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn publish(
        &mut self,
        message_type: MessageType,
        device_id: Option<&str>,
        metrics: Vec<Metric>,
    ) -> Result<u64> {
        self.lifecycle.check(message_type, device_id)?;
        let topic = self.topics.topic(message_type, device_id)?.to_topic_string();

        let built = self.sequencer.create(message_type, metrics);
        let sequenced = match built {
            Ok(sequenced) => sequenced,
            Err(e) => {
                if message_type == MessageType::NDeath {
                    self.lifecycle.record(message_type, device_id);
                }
                return Err(e);
            }
        };

        let sent = self.transport.publish(&topic, sequenced.bytes());
        if let Err(e) = sent {
            warn!(
                "Skipped {} on {} (seq {} consumed): {}",
                message_type,
                topic,
                sequenced.seq(),
                e
            );
            if message_type == MessageType::NDeath {
                self.lifecycle.record(message_type, device_id);
            }
            return Err(Error::PublishFailed {
                message_type,
                details: e.to_string(),
            });
        }

        self.lifecycle.record(message_type, device_id);
        log_published(&sequenced, &topic);
        Ok(sequenced.seq())
    }
}

fn restamp(metrics: &[Metric]) -> Vec<Metric> {
    let now = now_millis();
    metrics
        .iter()
        .cloned()
        .map(|metric| metric.with_timestamp(now))
        .collect()
}

fn log_published(sequenced: &SequencedPayload, topic: &str) {
    let message_type = sequenced.message_type();
    if message_type.is_birth() || message_type.is_death() {
        info!("Published {} seq={} on {}", message_type, sequenced.seq(), topic);
    } else {
        debug!("Published {} seq={} on {}", message_type, sequenced.seq(), topic);
    }
}
