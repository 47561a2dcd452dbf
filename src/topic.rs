//! Sparkplug topic construction and parsing.
//!
//! Sparkplug B topics follow the format:
//! - `spBv1.0/{group_id}/{message_type}/{edge_node_id}[/{device_id}]`
//! - `STATE/{scada_host_id}`
//!
//! Identifiers are inserted as given. Nothing here rejects IDs that contain
//! `/`, `+` or `#`; supplying well-formed IDs is the caller's job.

use crate::error::{Error, Result};

/// Namespace prefix of every Sparkplug B message topic.
pub const SPARKPLUG_NAMESPACE: &str = "spBv1.0";

/// Prefix of host application state topics.
pub const STATE_PREFIX: &str = "STATE";

/// Sparkplug message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Node Birth - published when a node comes online
    NBirth,
    /// Node Death - published when a node goes offline
    NDeath,
    /// Node Data - published when node metrics change
    NData,
    /// Node Command - command sent to a node
    NCmd,
    /// Device Birth - published when a device comes online
    DBirth,
    /// Device Death - published when a device goes offline
    DDeath,
    /// Device Data - published when device metrics change
    DData,
    /// Device Command - command sent to a device
    DCmd,
    /// State - SCADA host application state
    State,
}

impl MessageType {
    /// Returns the string representation used in MQTT topics.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::NBirth => "NBIRTH",
            MessageType::NDeath => "NDEATH",
            MessageType::NData => "NDATA",
            MessageType::NCmd => "NCMD",
            MessageType::DBirth => "DBIRTH",
            MessageType::DDeath => "DDEATH",
            MessageType::DData => "DDATA",
            MessageType::DCmd => "DCMD",
            MessageType::State => "STATE",
        }
    }

    /// Returns true if this is a node-level message type.
    pub fn is_node_message(&self) -> bool {
        matches!(
            self,
            MessageType::NBirth | MessageType::NDeath | MessageType::NData | MessageType::NCmd
        )
    }

    /// Returns true if this is a device-level message type.
    pub fn is_device_message(&self) -> bool {
        matches!(
            self,
            MessageType::DBirth | MessageType::DDeath | MessageType::DData | MessageType::DCmd
        )
    }

    /// Returns true if this is a birth message (NBIRTH or DBIRTH).
    pub fn is_birth(&self) -> bool {
        matches!(self, MessageType::NBirth | MessageType::DBirth)
    }

    /// Returns true if this is a death message (NDEATH or DDEATH).
    pub fn is_death(&self) -> bool {
        matches!(self, MessageType::NDeath | MessageType::DDeath)
    }

    /// Returns true if this is a data message (NDATA or DDATA).
    pub fn is_data(&self) -> bool {
        matches!(self, MessageType::NData | MessageType::DData)
    }

    /// Returns true if this is a command message (NCMD or DCMD).
    pub fn is_command(&self) -> bool {
        matches!(self, MessageType::NCmd | MessageType::DCmd)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NBIRTH" => Ok(MessageType::NBirth),
            "NDEATH" => Ok(MessageType::NDeath),
            "NDATA" => Ok(MessageType::NData),
            "NCMD" => Ok(MessageType::NCmd),
            "DBIRTH" => Ok(MessageType::DBirth),
            "DDEATH" => Ok(MessageType::DDeath),
            "DDATA" => Ok(MessageType::DData),
            "DCMD" => Ok(MessageType::DCmd),
            "STATE" => Ok(MessageType::State),
            _ => Err(Error::InvalidTopic(format!("unknown message type: {}", s))),
        }
    }
}

/// A parsed Sparkplug topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTopic {
    /// A Sparkplug message topic.
    Sparkplug {
        /// The message type.
        message_type: MessageType,
        /// The group ID.
        group_id: String,
        /// The edge node ID.
        edge_node_id: String,
        /// The device ID (only present for device-level messages).
        device_id: Option<String>,
    },
    /// A STATE topic for SCADA host application state.
    State {
        /// The SCADA host ID.
        host_id: String,
    },
}

impl ParsedTopic {
    /// Parses a Sparkplug topic string.
    ///
    /// # Examples
    ///
    /// ```
    /// use sparkplug_edge::ParsedTopic;
    ///
    /// // Node-level message
    /// let topic = ParsedTopic::parse("spBv1.0/Energy/NDATA/Gateway01")?;
    ///
    /// // Device-level message
    /// let topic = ParsedTopic::parse("spBv1.0/Energy/DDATA/Gateway01/Sensor01")?;
    ///
    /// // State message
    /// let topic = ParsedTopic::parse("STATE/ScadaHost01")?;
    /// # Ok::<(), sparkplug_edge::Error>(())
    /// ```
    pub fn parse(topic: &str) -> Result<Self> {
        let parts: Vec<&str> = topic.split('/').collect();

        let (group_id, message_type, edge_node_id, device_id) = match parts.as_slice() {
            [STATE_PREFIX, host_id] => {
                return Ok(ParsedTopic::State {
                    host_id: host_id.to_string(),
                })
            }
            [namespace, group, kind, node, rest @ ..] if rest.len() <= 1 => {
                if *namespace != SPARKPLUG_NAMESPACE {
                    return Err(Error::InvalidTopic(format!(
                        "topic must start with '{}', got '{}'",
                        SPARKPLUG_NAMESPACE, namespace
                    )));
                }
                let message_type: MessageType = kind.parse()?;
                (*group, message_type, *node, rest.first().copied())
            }
            _ => {
                return Err(Error::InvalidTopic(format!(
                    "topic must have 4 or 5 parts, got {}",
                    parts.len()
                )))
            }
        };

        match (message_type.is_device_message(), device_id) {
            (true, None) => {
                return Err(Error::InvalidTopic(format!(
                    "{} messages require a device_id",
                    message_type
                )))
            }
            (false, Some(_)) if message_type.is_node_message() => {
                return Err(Error::InvalidTopic(format!(
                    "{} messages should not have a device_id",
                    message_type
                )))
            }
            _ if !message_type.is_node_message() && !message_type.is_device_message() => {
                return Err(Error::InvalidTopic(format!(
                    "{} is not a node or device message",
                    message_type
                )))
            }
            _ => {}
        }

        Ok(ParsedTopic::Sparkplug {
            message_type,
            group_id: group_id.to_string(),
            edge_node_id: edge_node_id.to_string(),
            device_id: device_id.map(str::to_owned),
        })
    }

    /// Returns the message type, if this is a Sparkplug message.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            ParsedTopic::Sparkplug { message_type, .. } => Some(*message_type),
            ParsedTopic::State { .. } => None,
        }
    }

    /// Returns the group ID, if this is a Sparkplug message.
    pub fn group_id(&self) -> Option<&str> {
        match self {
            ParsedTopic::Sparkplug { group_id, .. } => Some(group_id),
            ParsedTopic::State { .. } => None,
        }
    }

    /// Returns the edge node ID, if this is a Sparkplug message.
    pub fn edge_node_id(&self) -> Option<&str> {
        match self {
            ParsedTopic::Sparkplug { edge_node_id, .. } => Some(edge_node_id),
            ParsedTopic::State { .. } => None,
        }
    }

    /// Returns the device ID, if this is a device-level Sparkplug message.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            ParsedTopic::Sparkplug { device_id, .. } => device_id.as_deref(),
            ParsedTopic::State { .. } => None,
        }
    }

    /// Returns the host ID, if this is a STATE message.
    pub fn host_id(&self) -> Option<&str> {
        match self {
            ParsedTopic::State { host_id } => Some(host_id),
            ParsedTopic::Sparkplug { .. } => None,
        }
    }

    /// Converts the parsed topic back to a topic string.
    pub fn to_topic_string(&self) -> String {
        match self {
            ParsedTopic::Sparkplug {
                message_type,
                group_id,
                edge_node_id,
                device_id,
            } => {
                if let Some(device_id) = device_id {
                    format!(
                        "{}/{}/{}/{}/{}",
                        SPARKPLUG_NAMESPACE,
                        group_id,
                        message_type.as_str(),
                        edge_node_id,
                        device_id
                    )
                } else {
                    format!(
                        "{}/{}/{}/{}",
                        SPARKPLUG_NAMESPACE,
                        group_id,
                        message_type.as_str(),
                        edge_node_id
                    )
                }
            }
            ParsedTopic::State { host_id } => format!("{}/{}", STATE_PREFIX, host_id),
        }
    }
}

impl std::fmt::Display for ParsedTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_topic_string())
    }
}

/// The identity of one edge node, fixed for the lifetime of a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Sparkplug group ID.
    pub group_id: String,
    /// Edge node identifier.
    pub edge_node_id: String,
    /// Default device for the device-level topic shortcuts.
    pub device_id: Option<String>,
    /// Host application whose STATE topic this node watches.
    pub scada_host_id: String,
}

impl NodeIdentity {
    /// Creates a node identity without a default device.
    pub fn new(
        group_id: impl Into<String>,
        edge_node_id: impl Into<String>,
        scada_host_id: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            edge_node_id: edge_node_id.into(),
            device_id: None,
            scada_host_id: scada_host_id.into(),
        }
    }

    /// Sets the default device.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

/// Derives every topic an edge node publishes to from its [`NodeIdentity`].
///
/// # Example
///
/// ```
/// use sparkplug_edge::{NodeIdentity, TopicBuilder};
///
/// let topics = TopicBuilder::new(
///     NodeIdentity::new("Devices", "Node-1", "scada-host-1").with_device_id("Dev-1"),
/// );
///
/// assert_eq!(topics.nbirth_topic(), "spBv1.0/Devices/NBIRTH/Node-1");
/// assert_eq!(topics.dbirth_topic()?, "spBv1.0/Devices/DBIRTH/Node-1/Dev-1");
/// assert_eq!(topics.state_topic(), "STATE/scada-host-1");
/// # Ok::<(), sparkplug_edge::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicBuilder {
    identity: NodeIdentity,
}

impl TopicBuilder {
    /// Creates a topic builder for the given node.
    pub fn new(identity: NodeIdentity) -> Self {
        Self { identity }
    }

    /// The node identity topics are derived from.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Builds the topic for any node or device message type.
    ///
    /// Device message types need `device_id`; node message types must not
    /// have one. STATE is not a node topic, use [`TopicBuilder::state_topic`].
    pub fn topic(&self, message_type: MessageType, device_id: Option<&str>) -> Result<ParsedTopic> {
        if message_type == MessageType::State {
            return Err(Error::InvalidTopic(
                "STATE topics are scoped to a host, not a node".to_string(),
            ));
        }
        if message_type.is_device_message() && device_id.is_none() {
            return Err(Error::MissingDeviceId { message_type });
        }
        if message_type.is_node_message() && device_id.is_some() {
            return Err(Error::InvalidTopic(format!(
                "{} messages should not have a device_id",
                message_type
            )));
        }

        Ok(ParsedTopic::Sparkplug {
            message_type,
            group_id: self.identity.group_id.clone(),
            edge_node_id: self.identity.edge_node_id.clone(),
            device_id: device_id.map(str::to_owned),
        })
    }

    fn node_topic(&self, message_type: MessageType) -> String {
        format!(
            "{}/{}/{}/{}",
            SPARKPLUG_NAMESPACE,
            self.identity.group_id,
            message_type.as_str(),
            self.identity.edge_node_id
        )
    }

    fn default_device_topic(&self, message_type: MessageType) -> Result<String> {
        let device_id = self
            .identity
            .device_id
            .as_deref()
            .ok_or(Error::MissingDeviceId { message_type })?;
        Ok(self.device_topic(message_type, device_id))
    }

    /// Builds a device topic for an explicit device.
    pub fn device_topic(&self, message_type: MessageType, device_id: &str) -> String {
        format!("{}/{}", self.node_topic(message_type), device_id)
    }

    /// `spBv1.0/{group}/NBIRTH/{node}`
    pub fn nbirth_topic(&self) -> String {
        self.node_topic(MessageType::NBirth)
    }

    /// `spBv1.0/{group}/NDATA/{node}`
    pub fn ndata_topic(&self) -> String {
        self.node_topic(MessageType::NData)
    }

    /// `spBv1.0/{group}/NDEATH/{node}`
    pub fn ndeath_topic(&self) -> String {
        self.node_topic(MessageType::NDeath)
    }

    /// `spBv1.0/{group}/DBIRTH/{node}/{device}` for the default device.
    pub fn dbirth_topic(&self) -> Result<String> {
        self.default_device_topic(MessageType::DBirth)
    }

    /// `spBv1.0/{group}/DDATA/{node}/{device}` for the default device.
    pub fn ddata_topic(&self) -> Result<String> {
        self.default_device_topic(MessageType::DData)
    }

    /// `spBv1.0/{group}/DDEATH/{node}/{device}` for the default device.
    pub fn ddeath_topic(&self) -> Result<String> {
        self.default_device_topic(MessageType::DDeath)
    }

    /// `STATE/{scada_host}`, without the namespace prefix.
    pub fn state_topic(&self) -> String {
        format!("{}/{}", STATE_PREFIX, self.identity.scada_host_id)
    }
}
