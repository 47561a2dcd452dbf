//! Per-node payload sequencing.

use crate::error::Result;
use crate::metric::Metric;
use crate::payload::Payload;
use crate::topic::MessageType;
use crate::types::now_millis;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Number of distinct wire sequence numbers; the wire field runs 0..=255.
pub const SEQ_MODULUS: u64 = 256;

/// Reduces an internal counter value to the sequence number sent on the wire.
///
/// ```
/// use sparkplug_edge::wire_seq;
///
/// assert_eq!(wire_seq(1), 1);
/// assert_eq!(wire_seq(255), 255);
/// assert_eq!(wire_seq(256), 0);
/// ```
pub fn wire_seq(counter: u64) -> u64 {
    counter % SEQ_MODULUS
}

/// A payload that has been assigned its place in the node's sequence and
/// serialized.
#[derive(Debug, Clone)]
pub struct SequencedPayload {
    message_type: MessageType,
    counter: u64,
    payload: Payload,
    bytes: Vec<u8>,
}

impl SequencedPayload {
    /// The lifecycle message this payload was built for.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// The internal counter value consumed by this payload.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The sequence number carried on the wire (0-255).
    pub fn seq(&self) -> u64 {
        wire_seq(self.counter)
    }

    /// The payload UUID.
    pub fn uuid(&self) -> Option<&str> {
        self.payload.uuid()
    }

    /// The payload as built.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The serialized bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the payload, returning the serialized bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Owns the sequence counter of one edge node and stamps every payload the
/// node produces.
///
/// The counter starts at 0 and is advanced exactly once per payload, before
/// the payload is serialized, so a payload that fails to serialize still
/// consumes its number. It is never reset while the sequencer lives. All
/// methods take `&self`; share the sequencer through an `Arc` when node and
/// device payloads are built on different threads.
///
/// # Example
///
/// ```
/// use sparkplug_edge::{Metric, PayloadSequencer};
///
/// let sequencer = PayloadSequencer::new();
/// let birth = sequencer.create_nbirth(vec![Metric::new("Temperature", 20.5)])?;
/// let data = sequencer.create_ndata(vec![Metric::new("Temperature", 21.0)])?;
/// assert_eq!(birth.seq(), 1);
/// assert_eq!(data.seq(), 2);
/// # Ok::<(), sparkplug_edge::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct PayloadSequencer {
    counter: AtomicU64,
}

impl PayloadSequencer {
    /// Creates a sequencer with its counter at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads produced so far (the last counter value assigned).
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Wire sequence number of the most recent payload.
    pub fn seq(&self) -> u64 {
        wire_seq(self.counter())
    }

    /// Builds an NBIRTH payload.
    pub fn create_nbirth(&self, metrics: Vec<Metric>) -> Result<SequencedPayload> {
        self.create(MessageType::NBirth, metrics)
    }

    /// Builds an NDATA payload.
    pub fn create_ndata(&self, metrics: Vec<Metric>) -> Result<SequencedPayload> {
        self.create(MessageType::NData, metrics)
    }

    /// Builds a DBIRTH payload.
    pub fn create_dbirth(&self, metrics: Vec<Metric>) -> Result<SequencedPayload> {
        self.create(MessageType::DBirth, metrics)
    }

    /// Builds a DDATA payload.
    pub fn create_ddata(&self, metrics: Vec<Metric>) -> Result<SequencedPayload> {
        self.create(MessageType::DData, metrics)
    }

    /// Builds an NDEATH payload. It carries no metrics.
    pub fn create_ndeath(&self) -> Result<SequencedPayload> {
        self.create(MessageType::NDeath, Vec::new())
    }

    /// Builds a DDEATH payload. It carries no metrics.
    pub fn create_ddeath(&self) -> Result<SequencedPayload> {
        self.create(MessageType::DDeath, Vec::new())
    }

    pub(crate) fn create(
        &self,
        message_type: MessageType,
        metrics: Vec<Metric>,
    ) -> Result<SequencedPayload> {
        let counter = self.next_counter();
        let payload = Payload::new(
            Some(now_millis()),
            Some(wire_seq(counter)),
            Some(Uuid::new_v4().to_string()),
            metrics,
        );

        let bytes = payload.encode().inspect_err(|e| {
            warn!(
                "{} payload #{} failed to serialize, sequence number consumed: {}",
                message_type, counter, e
            );
        })?;

        debug!(
            "Built {} payload: seq={} counter={} metrics={} bytes={}",
            message_type,
            wire_seq(counter),
            counter,
            payload.metric_count(),
            bytes.len()
        );

        Ok(SequencedPayload {
            message_type,
            counter,
            payload,
            bytes,
        })
    }

    fn next_counter(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
