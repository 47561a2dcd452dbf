//! Sparkplug payload building and parsing.

use crate::codec::{decode_metric, encode_metric};
use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::proto;
use crate::types::{now_millis, MetricValue};
use prost::Message;
use std::collections::HashSet;

/// A Sparkplug payload: a timestamped, sequenced list of metrics.
///
/// Payloads produced by the [`PayloadSequencer`](crate::PayloadSequencer)
/// always carry a timestamp, sequence number and UUID; parsed payloads carry
/// whatever the sender included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    timestamp: Option<u64>,
    seq: Option<u64>,
    uuid: Option<String>,
    metrics: Vec<Metric>,
    body: Option<Vec<u8>>,
}

impl Payload {
    pub(crate) fn new(
        timestamp: Option<u64>,
        seq: Option<u64>,
        uuid: Option<String>,
        metrics: Vec<Metric>,
    ) -> Self {
        Self {
            timestamp,
            seq,
            uuid,
            metrics,
            body: None,
        }
    }

    /// Parses a Sparkplug payload from binary protobuf data.
    ///
    /// Malformed protobuf is an error; metrics whose values cannot be
    /// interpreted are kept as null metrics.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw = proto::Payload::decode(data)?;
        Ok(Self {
            timestamp: raw.timestamp,
            seq: raw.seq,
            uuid: raw.uuid,
            metrics: raw.metrics.into_iter().map(decode_metric).collect(),
            body: raw.body,
        })
    }

    /// Validates the payload and serializes it to binary protobuf format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        Ok(self.to_proto().encode_to_vec())
    }

    /// Checks every metric and that metric names are unique.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for metric in &self.metrics {
            metric.validate()?;
            if let Some(name) = metric.name() {
                if !names.insert(name) {
                    return Err(Error::DuplicateMetric {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the wire representation without validating it.
    pub fn to_proto(&self) -> proto::Payload {
        proto::Payload {
            timestamp: self.timestamp,
            metrics: self.metrics.iter().map(encode_metric).collect(),
            seq: self.seq,
            uuid: self.uuid.clone(),
            body: self.body.clone(),
        }
    }

    /// Gets the payload-level timestamp, if present.
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Gets the payload-level sequence number, if present.
    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    /// Gets the payload UUID, if present.
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Gets the opaque body, if present.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Returns the number of metrics in the payload.
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Gets a metric at the specified index.
    pub fn metric_at(&self, index: usize) -> Result<&Metric> {
        self.metrics.get(index).ok_or(Error::InvalidMetricIndex {
            index,
            count: self.metrics.len(),
        })
    }

    /// Finds a metric by name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name() == Some(name))
    }

    /// Returns an iterator over all metrics in transmission order.
    pub fn metrics(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }
}

/// A Sparkplug payload builder for creating NBIRTH, NDATA, and other messages.
///
/// Use the typed adders for scalar metrics, or [`PayloadBuilder::add_metric`]
/// for DataSets, Templates and metrics with properties.
///
/// # Example
///
/// ```
/// use sparkplug_edge::{Payload, PayloadBuilder};
///
/// let mut builder = PayloadBuilder::new();
/// builder
///     .add_double_with_alias("Temperature", 1, 20.5)
///     .add_bool_with_alias("Active", 2, true);
///
/// let bytes = builder.serialize()?;
/// let payload = Payload::parse(&bytes)?;
/// assert_eq!(payload.metric_count(), 2);
/// # Ok::<(), sparkplug_edge::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    timestamp: Option<u64>,
    seq: Option<u64>,
    uuid: Option<String>,
    metrics: Vec<Metric>,
}

macro_rules! typed_adders {
    ($($ty:ty => $name:ident, $with_alias:ident, $by_alias:ident;)*) => {
        $(
            #[doc = concat!("Adds a `", stringify!($ty), "` metric by name.")]
            pub fn $name(&mut self, name: &str, value: $ty) -> &mut Self {
                self.add(name, value)
            }

            #[doc = concat!("Adds a `", stringify!($ty), "` metric with both name and alias (for NBIRTH).")]
            pub fn $with_alias(&mut self, name: &str, alias: u64, value: $ty) -> &mut Self {
                self.add_with_alias(name, alias, value)
            }

            #[doc = concat!("Adds a `", stringify!($ty), "` metric by alias only (for NDATA).")]
            pub fn $by_alias(&mut self, alias: u64, value: $ty) -> &mut Self {
                self.add_by_alias(alias, value)
            }
        )*
    };
}

impl PayloadBuilder {
    /// Creates a new, empty payload builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload-level timestamp in milliseconds since Unix epoch.
    pub fn set_timestamp(&mut self, timestamp: u64) -> &mut Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the sequence number manually (not recommended in normal operation).
    pub fn set_seq(&mut self, seq: u64) -> &mut Self {
        self.seq = Some(seq);
        self
    }

    /// Sets the payload UUID.
    pub fn set_uuid(&mut self, uuid: impl Into<String>) -> &mut Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Adds a fully built metric.
    pub fn add_metric(&mut self, metric: Metric) -> &mut Self {
        self.metrics.push(metric);
        self
    }

    /// Adds a metric of any supported kind by name.
    pub fn add(&mut self, name: &str, value: impl Into<MetricValue>) -> &mut Self {
        self.add_metric(Metric::new(name, value))
    }

    /// Adds a metric of any supported kind with both name and alias.
    pub fn add_with_alias(
        &mut self,
        name: &str,
        alias: u64,
        value: impl Into<MetricValue>,
    ) -> &mut Self {
        self.add_metric(Metric::new(name, value).with_alias(alias))
    }

    /// Adds a metric of any supported kind by alias only.
    pub fn add_by_alias(&mut self, alias: u64, value: impl Into<MetricValue>) -> &mut Self {
        self.add_metric(Metric::by_alias(alias, value))
    }

    typed_adders! {
        i8 => add_int8, add_int8_with_alias, add_int8_by_alias;
        i16 => add_int16, add_int16_with_alias, add_int16_by_alias;
        i32 => add_int32, add_int32_with_alias, add_int32_by_alias;
        i64 => add_int64, add_int64_with_alias, add_int64_by_alias;
        u8 => add_uint8, add_uint8_with_alias, add_uint8_by_alias;
        u16 => add_uint16, add_uint16_with_alias, add_uint16_by_alias;
        u32 => add_uint32, add_uint32_with_alias, add_uint32_by_alias;
        u64 => add_uint64, add_uint64_with_alias, add_uint64_by_alias;
        f32 => add_float, add_float_with_alias, add_float_by_alias;
        f64 => add_double, add_double_with_alias, add_double_by_alias;
        bool => add_bool, add_bool_with_alias, add_bool_by_alias;
        &str => add_string, add_string_with_alias, add_string_by_alias;
        &[u8] => add_bytes, add_bytes_with_alias, add_bytes_by_alias;
    }

    /// Number of metrics added so far.
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Consumes the builder, returning its metrics for a sequenced payload.
    pub fn into_metrics(self) -> Vec<Metric> {
        self.metrics
    }

    /// Builds the payload, stamping the current time if no timestamp was set.
    pub fn build(self) -> Payload {
        Payload::new(
            Some(self.timestamp.unwrap_or_else(now_millis)),
            self.seq,
            self.uuid,
            self.metrics,
        )
    }

    /// Serializes the payload to binary protobuf format.
    ///
    /// Returns a vector of bytes that can be handed to a transport.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.clone().build().encode()
    }
}
