//! Sparkplug B 2.2 edge node publishing in Rust.
//!
//! This library builds Sparkplug B payloads, numbers them in a node's message
//! sequence and routes them to the right topic. It enables Industrial IoT
//! edge nodes to publish telemetry over MQTT without breaking the
//! birth/data/death ordering host applications depend on.
//!
//! # Features
//!
//! - **Typed metrics**: A closed [`MetricValue`] enum over every Sparkplug datatype
//! - **Structured values**: [`DataSet`], [`PropertySet`] and [`Template`] with shape checks
//! - **Sequencing**: Gap-free counter with a wrapping 0-255 wire `seq` and a UUID per payload
//! - **Ordering**: Birth-before-data-before-death enforced per node and per device
//! - **Pluggable transport**: MQTT via rumqttc, or any [`Transport`] implementation
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`Metric`] / [`MetricValue`]: A single named, typed value
//! - [`PayloadBuilder`]: Build payloads with type-safe metric additions
//! - [`Payload`]: Parse and read payloads
//! - [`PayloadSequencer`]: Stamp payloads with `seq`, timestamp and UUID
//! - [`TopicBuilder`]: Derive `spBv1.0/...` and `STATE/...` topics
//! - [`Lifecycle`]: Track node and device lifecycle state
//! - [`Publisher`]: Tie all of the above to a transport
//!
//! Integers of every width travel in the protobuf `long_value` field while
//! the metric's datatype keeps the declared width, so a `u8` metric reads
//! back as a `u8`.
//!
//! # Example: Publisher
//!
//! ```no_run
//! use sparkplug_edge::{Metric, PropertySet, Publisher, PublisherConfig};
//!
//! # fn main() -> Result<(), sparkplug_edge::Error> {
//! let config = PublisherConfig::new(
//!     "tcp://localhost:1883",
//!     "my_publisher",
//!     "Energy",
//!     "Gateway01"
//! );
//!
//! let mut publisher = Publisher::with_mqtt(config)?;
//! publisher.connect()?;
//!
//! // NBIRTH with metrics, aliases and properties
//! let properties = PropertySet::new()
//!     .with("engUnit", "Celsius")
//!     .with("engHigh", 100.0);
//! publisher.publish_birth(vec![
//!     Metric::new("Temperature", 20.5).with_alias(1).with_properties(properties),
//!     Metric::new("Active", true).with_alias(2),
//! ])?;
//!
//! // NDATA updates using aliases
//! publisher.publish_data(vec![Metric::by_alias(1, 21.0)])?;
//!
//! // Publishes NDEATH, then disconnects
//! publisher.disconnect()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Payloads without a broker
//!
//! ```
//! use sparkplug_edge::{Metric, MetricValue, Payload, PayloadSequencer};
//!
//! # fn main() -> Result<(), sparkplug_edge::Error> {
//! let sequencer = PayloadSequencer::new();
//! let birth = sequencer.create_nbirth(vec![Metric::new("Level", 7u8)])?;
//!
//! let payload = Payload::parse(birth.bytes())?;
//! assert_eq!(payload.seq(), Some(1));
//! assert_eq!(payload.metric_at(0)?.value(), &MetricValue::UInt8(7));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod codec;

pub mod dataset;
pub mod error;
pub mod lifecycle;
pub mod metric;
pub mod payload;
pub mod property;
pub mod proto;
pub mod publisher;
pub mod sequencer;
pub mod template;
pub mod topic;
pub mod transport;
pub mod types;

pub use dataset::DataSet;
pub use error::{Error, Result};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use metric::Metric;
pub use payload::{Payload, PayloadBuilder};
pub use property::{PropertyKind, PropertySet, PropertyValue};
pub use publisher::{ClientCredentials, Publisher, PublisherConfig};
pub use sequencer::{wire_seq, PayloadSequencer, SequencedPayload};
pub use template::{Parameter, Template};
pub use topic::{MessageType, NodeIdentity, ParsedTopic, TopicBuilder};
pub use transport::{MqttTransport, Transport};
pub use types::{DataType, MetricValue};
