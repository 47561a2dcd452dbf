//! Tests for the Publisher lifecycle and sequencing over an in-memory transport

use sparkplug_edge::{
    DataSet, DataType, Error, LifecycleState, MessageType, Metric, MetricValue, Payload,
    Publisher, PublisherConfig, Result, Transport,
};

/// Records everything published; can be told to fail the next publish or
/// every publish to one topic.
#[derive(Default)]
struct RecordingTransport {
    connected: bool,
    fail_next: bool,
    fail_topic: Option<String>,
    published: Vec<(String, Vec<u8>)>,
}

impl RecordingTransport {
    fn payload(&self, index: usize) -> Payload {
        Payload::parse(&self.published[index].1).unwrap()
    }

    fn topic(&self, index: usize) -> &str {
        &self.published[index].0
    }
}

impl Transport for RecordingTransport {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.fail_next || self.fail_topic.as_deref() == Some(topic) {
            self.fail_next = false;
            return Err(Error::ConnectionFailed("broker went away".to_string()));
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }
}

fn publisher() -> Publisher<RecordingTransport> {
    let config = PublisherConfig::new("tcp://localhost:1883", "test", "Devices", "Node-1")
        .with_device_id("Dev-1");
    let mut publisher = Publisher::new(config, RecordingTransport::default()).unwrap();
    publisher.connect().unwrap();
    publisher
}

fn birth_metrics() -> Vec<Metric> {
    vec![
        Metric::new("Node Control/Rebirth", false).with_alias(1),
        Metric::new("Temperature", 20.5).with_alias(2),
    ]
}

#[test]
fn test_birth_data_death_sequence() {
    let mut publisher = publisher();

    let birth = publisher.publish_birth(birth_metrics()).unwrap();
    let data = publisher
        .publish_data(vec![Metric::by_alias(2, 21.0)])
        .unwrap();
    let death = publisher.publish_death().unwrap();

    assert_eq!((birth, data, death), (1, 2, 3));
    assert!(death > data, "NDEATH must follow the last NDATA");
    assert_eq!(publisher.node_state(), LifecycleState::Dead);

    let transport = publisher.transport();
    assert_eq!(transport.topic(0), "spBv1.0/Devices/NBIRTH/Node-1");
    assert_eq!(transport.topic(1), "spBv1.0/Devices/NDATA/Node-1");
    assert_eq!(transport.topic(2), "spBv1.0/Devices/NDEATH/Node-1");
    assert_eq!(transport.payload(2).seq(), Some(3));
    assert_eq!(transport.payload(2).metric_count(), 0);
}

#[test]
fn test_data_before_birth_consumes_nothing() {
    let mut publisher = publisher();

    let result = publisher.publish_data(vec![Metric::new("Temperature", 1.0)]);
    assert!(matches!(
        result,
        Err(Error::LifecycleViolation {
            message_type: MessageType::NData,
            state: LifecycleState::Unborn,
            ..
        })
    ));
    assert_eq!(publisher.counter(), 0);
    assert!(publisher.transport().published.is_empty());
}

#[test]
fn test_device_lifecycle() {
    let mut publisher = publisher();

    assert!(publisher
        .publish_device_birth("Dev-1", vec![Metric::new("Voltage", 230.0)])
        .is_err());

    publisher.publish_birth(birth_metrics()).unwrap();
    assert!(publisher
        .publish_device_data("Dev-1", vec![Metric::new("Voltage", 231.0)])
        .is_err());

    publisher
        .publish_device_birth("Dev-1", vec![Metric::new("Voltage", 230.0)])
        .unwrap();
    publisher
        .publish_device_data("Dev-1", vec![Metric::new("Voltage", 231.0)])
        .unwrap();
    assert_eq!(publisher.device_state("Dev-1"), LifecycleState::Publishing);

    publisher.publish_device_death("Dev-1").unwrap();
    assert_eq!(publisher.device_state("Dev-1"), LifecycleState::Dead);

    let transport = publisher.transport();
    assert_eq!(transport.topic(1), "spBv1.0/Devices/DBIRTH/Node-1/Dev-1");
    assert_eq!(transport.topic(2), "spBv1.0/Devices/DDATA/Node-1/Dev-1");
    assert_eq!(transport.topic(3), "spBv1.0/Devices/DDEATH/Node-1/Dev-1");
}

#[test]
fn test_node_and_device_share_one_sequence() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher.publish_device_birth("Dev-1", Vec::new()).unwrap();
    publisher.publish_data(Vec::new()).unwrap();
    publisher.publish_device_data("Dev-1", Vec::new()).unwrap();

    let seqs: Vec<_> = (0..4)
        .map(|i| publisher.transport().payload(i).seq().unwrap())
        .collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
}

#[test]
fn test_failed_serialization_consumes_number() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();

    let bad = DataSet::new(["a", "b"], [DataType::Int32]);
    let result = publisher.publish_data(vec![Metric::new("Table", bad)]);
    assert!(matches!(result, Err(Error::DatasetShapeMismatch { .. })));
    assert_eq!(publisher.counter(), 2);

    let next = publisher.publish_data(vec![Metric::by_alias(2, 1.0)]).unwrap();
    assert_eq!(next, 3);
    assert_eq!(publisher.transport().published.len(), 2);
}

#[test]
fn test_transport_failure_consumes_number_but_keeps_state() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();

    publisher.transport_mut().fail_next = true;
    let result = publisher.publish_data(vec![Metric::by_alias(2, 1.0)]);
    assert!(matches!(
        result,
        Err(Error::PublishFailed {
            message_type: MessageType::NData,
            ..
        })
    ));
    assert_eq!(publisher.counter(), 2);
    assert_eq!(publisher.node_state(), LifecycleState::Born);

    assert_eq!(publisher.publish_data(Vec::new()).unwrap(), 3);
}

#[test]
fn test_death_is_terminal_even_when_publish_fails() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();

    publisher.transport_mut().fail_next = true;
    assert!(publisher.publish_death().is_err());
    assert_eq!(publisher.node_state(), LifecycleState::Dead);
    assert!(publisher.publish_death().is_err());
    assert!(publisher.publish_birth(birth_metrics()).is_err());
}

#[test]
fn test_disconnect_publishes_death_once() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher.publish_data(Vec::new()).unwrap();

    publisher.disconnect().unwrap();
    let transport = publisher.transport();
    assert!(!transport.connected);
    assert_eq!(transport.published.len(), 3);
    assert_eq!(transport.topic(2), "spBv1.0/Devices/NDEATH/Node-1");
    assert_eq!(transport.payload(2).seq(), Some(3));
}

#[test]
fn test_disconnect_after_explicit_death() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher.publish_death().unwrap();
    publisher.disconnect().unwrap();
    assert_eq!(publisher.transport().published.len(), 2);
}

#[test]
fn test_rebirth_republishes_node_and_devices() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher
        .publish_device_birth("Dev-1", vec![Metric::new("Voltage", 230.0)])
        .unwrap();
    publisher.publish_device_birth("Dev-2", Vec::new()).unwrap();
    publisher.publish_device_death("Dev-2").unwrap();

    let seq = publisher.rebirth().unwrap();
    assert_eq!(seq, 5);
    assert_eq!(publisher.device_state("Dev-1"), LifecycleState::Born);
    assert_eq!(publisher.device_state("Dev-2"), LifecycleState::Unborn);

    let transport = publisher.transport();
    assert_eq!(transport.published.len(), 6);
    assert_eq!(transport.topic(4), "spBv1.0/Devices/NBIRTH/Node-1");
    assert_eq!(transport.topic(5), "spBv1.0/Devices/DBIRTH/Node-1/Dev-1");

    let rebirth = transport.payload(4);
    assert_eq!(rebirth.metric_count(), 2);
    assert_eq!(
        rebirth.metric("Temperature").map(Metric::value),
        Some(&MetricValue::Double(20.5))
    );
}

#[test]
fn test_rebirth_stops_at_failed_device_birth() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher.publish_device_birth("Dev-1", Vec::new()).unwrap();
    publisher.publish_device_birth("Dev-2", Vec::new()).unwrap();

    publisher.transport_mut().fail_topic = Some("spBv1.0/Devices/DBIRTH/Node-1/Dev-1".to_string());
    assert!(matches!(
        publisher.rebirth(),
        Err(Error::PublishFailed {
            message_type: MessageType::DBirth,
            ..
        })
    ));

    let transport = publisher.transport();
    assert_eq!(transport.published.len(), 4);
    assert_eq!(transport.topic(3), "spBv1.0/Devices/NBIRTH/Node-1");
    assert_eq!(publisher.node_state(), LifecycleState::Born);
    assert_eq!(publisher.device_state("Dev-1"), LifecycleState::Unborn);
    assert_eq!(publisher.device_state("Dev-2"), LifecycleState::Unborn);
}

#[test]
fn test_rebirth_requires_birth() {
    let mut publisher = publisher();
    assert!(matches!(
        publisher.rebirth(),
        Err(Error::LifecycleViolation { .. })
    ));
    assert_eq!(publisher.counter(), 0);
}

#[test]
fn test_seq_wraps_after_255() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    for _ in 0..254 {
        publisher.publish_data(Vec::new()).unwrap();
    }
    assert_eq!(publisher.seq(), 255);

    assert_eq!(publisher.publish_data(Vec::new()).unwrap(), 0);
    assert_eq!(publisher.publish_data(Vec::new()).unwrap(), 1);
    assert_eq!(publisher.counter(), 257);
}

#[test]
fn test_every_payload_has_unique_uuid() {
    let mut publisher = publisher();
    publisher.publish_birth(birth_metrics()).unwrap();
    publisher.publish_data(Vec::new()).unwrap();

    let transport = publisher.transport();
    let a = transport.payload(0);
    let b = transport.payload(1);
    assert!(a.uuid().is_some());
    assert_ne!(a.uuid(), b.uuid());
    assert!(a.timestamp().is_some());
}

#[test]
fn test_publish_without_connect_fails() {
    let config = PublisherConfig::default();
    let mut publisher = Publisher::new(config, RecordingTransport::default()).unwrap();
    assert!(matches!(
        publisher.publish_birth(birth_metrics()),
        Err(Error::PublishFailed {
            message_type: MessageType::NBirth,
            ..
        })
    ));
    assert_eq!(publisher.node_state(), LifecycleState::Unborn);
}
