//! Error types for the Sparkplug edge publisher.

use crate::lifecycle::LifecycleState;
use crate::topic::MessageType;
use crate::types::DataType;
use thiserror::Error;

/// Result type alias for Sparkplug operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur when building or publishing Sparkplug messages.
#[derive(Error, Debug)]
pub enum Error {
    /// A DataSet's columns, types and rows disagree in shape or kind.
    #[error("DataSet shape mismatch: {details}")]
    DatasetShapeMismatch {
        /// What exactly did not line up
        details: String,
    },

    /// A metric's datatype tag does not agree with the value it carries.
    #[error("Metric '{metric}' is tagged {declared} but carries a {actual} value")]
    DatatypeMismatch {
        /// The offending metric name (or alias)
        metric: String,
        /// The tag declared on the metric
        declared: DataType,
        /// The kind of the carried value
        actual: DataType,
    },

    /// Two metrics in one payload share the same name.
    #[error("Duplicate metric name in payload: {name}")]
    DuplicateMetric {
        /// The repeated metric name
        name: String,
    },

    /// Failed to parse a payload.
    #[error("Failed to parse payload: {0}")]
    ParseFailed(#[from] prost::DecodeError),

    /// Invalid metric index.
    #[error("Invalid metric index: {index} (payload has {count} metrics)")]
    InvalidMetricIndex {
        /// The invalid index that was requested
        index: usize,
        /// The actual metric count in the payload
        count: usize,
    },

    /// A topic string could not be parsed or built.
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// A device-level topic was requested without a device ID.
    #[error("{message_type} topic requires a device ID but none is configured")]
    MissingDeviceId {
        /// The device-level message type that was requested
        message_type: MessageType,
    },

    /// A message was published out of birth/data/death order.
    #[error("Cannot publish {message_type} for {scope} in state {state}")]
    LifecycleViolation {
        /// The message type that was rejected
        message_type: MessageType,
        /// The node or device the message was scoped to
        scope: String,
        /// The state the scope was in at the time
        state: LifecycleState,
    },

    /// The publisher configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to connect to MQTT broker.
    #[error("Failed to connect to broker: {0}")]
    ConnectionFailed(String),

    /// The transport was used before `connect()` succeeded.
    #[error("Transport is not connected")]
    NotConnected,

    /// The MQTT client rejected a request.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to publish a message.
    #[error("Failed to publish {message_type}: {details}")]
    PublishFailed {
        /// The type of message that failed to publish
        message_type: MessageType,
        /// Additional details about the failure
        details: String,
    },
}
