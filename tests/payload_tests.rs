//! Tests for PayloadBuilder and Payload parsing

use sparkplug_edge::{
    DataSet, DataType, Error, Metric, MetricValue, Payload, PayloadBuilder, PropertyKind,
    PropertySet, PropertyValue, Template,
};

fn round_trip(metric: Metric) -> Metric {
    let mut builder = PayloadBuilder::new();
    builder.add_metric(metric);
    let bytes = builder.serialize().unwrap();
    let payload = Payload::parse(&bytes).unwrap();
    payload.metric_at(0).unwrap().clone()
}

#[test]
fn test_add_metrics_by_name() {
    let mut builder = PayloadBuilder::new();

    builder
        .add_int8("test_i8", 42)
        .add_int16("test_i16", 1234)
        .add_int32("test_i32", 123456)
        .add_int64("test_i64", 123456789)
        .add_uint8("test_u8", 255)
        .add_uint16("test_u16", 65535)
        .add_uint32("test_u32", 4294967295)
        .add_uint64("test_u64", 18446744073709551615)
        .add_float("test_f32", std::f32::consts::PI)
        .add_double("test_f64", std::f64::consts::E)
        .add_bool("test_bool", true)
        .add_string("test_str", "hello")
        .add_bytes("test_bytes", &[1, 2, 3]);

    assert_eq!(builder.metric_count(), 13);
    assert!(builder.serialize().is_ok());
}

#[test]
fn test_scalar_round_trip_keeps_value_and_tag() {
    let cases = vec![
        (MetricValue::Int8(i8::MIN), DataType::Int8),
        (MetricValue::Int16(-1234), DataType::Int16),
        (MetricValue::Int32(i32::MIN), DataType::Int32),
        (MetricValue::Int64(i64::MIN), DataType::Int64),
        (MetricValue::UInt8(u8::MAX), DataType::UInt8),
        (MetricValue::UInt16(u16::MAX), DataType::UInt16),
        (MetricValue::UInt32(u32::MAX), DataType::UInt32),
        (MetricValue::UInt64(u64::MAX), DataType::UInt64),
        (MetricValue::Float(3.5), DataType::Float),
        (MetricValue::Double(-2.25), DataType::Double),
        (MetricValue::Boolean(true), DataType::Boolean),
        (MetricValue::String("hello".to_string()), DataType::String),
        (MetricValue::Text("long text".to_string()), DataType::Text),
        (
            MetricValue::Uuid("0f8fad5b-d9cb-469f-a165-70867728950e".to_string()),
            DataType::Uuid,
        ),
        (MetricValue::DateTime(1_700_000_000_000), DataType::DateTime),
        (MetricValue::Bytes(vec![0, 1, 254, 255]), DataType::Bytes),
        (MetricValue::File(vec![7; 16]), DataType::File),
    ];

    for (value, datatype) in cases {
        let decoded = round_trip(Metric::new("m", value.clone()));
        assert_eq!(decoded.datatype(), datatype);
        assert_eq!(decoded.value(), &value, "{}", datatype);
        assert_eq!(decoded.name(), Some("m"));
    }
}

#[test]
fn test_null_metric_round_trip() {
    let decoded = round_trip(Metric::null("missing", DataType::Double));
    assert!(decoded.is_null());
    assert_eq!(decoded.datatype(), DataType::Double);
}

#[test]
fn test_metric_flags_round_trip() {
    let decoded = round_trip(
        Metric::new("h", 1i32)
            .with_alias(9)
            .with_timestamp(1234)
            .historical()
            .transient(),
    );
    assert_eq!(decoded.alias(), Some(9));
    assert_eq!(decoded.timestamp(), Some(1234));
    assert!(decoded.is_historical());
    assert!(decoded.is_transient());
}

#[test]
fn test_dataset_round_trip() {
    let mut ds = DataSet::new(
        ["timestamp", "value", "quality"],
        ["String", "Double", "Int32"],
    );
    assert_eq!(ds.num_of_columns(), 3);
    assert_eq!(ds.row_count(), 0);

    ds.add_row(vec![
        MetricValue::from("2024-01-01T00:00:00Z"),
        MetricValue::Double(20.5),
        MetricValue::Int32(192),
    ])
    .unwrap()
    .add_row(vec![
        MetricValue::from("2024-01-01T00:01:00Z"),
        MetricValue::Null,
        MetricValue::Int32(0),
    ])
    .unwrap();

    let decoded = round_trip(Metric::new("Table", ds.clone()));
    assert_eq!(decoded.datatype(), DataType::DataSet);
    assert_eq!(decoded.value(), &MetricValue::DataSet(ds));
}

#[test]
fn test_empty_dataset_reports_columns() {
    let ds = DataSet::new(["a", "b", "c", "d"], [DataType::Int32; 4]);
    let decoded = round_trip(Metric::new("Empty", ds));
    match decoded.value() {
        MetricValue::DataSet(ds) => {
            assert_eq!(ds.num_of_columns(), 4);
            assert_eq!(ds.row_count(), 0);
        }
        other => panic!("Expected DataSet, got {:?}", other),
    }
}

#[test]
fn test_dataset_shape_mismatch() {
    let mut ds = DataSet::new(["a", "b"], [DataType::Int32, DataType::Double]);
    assert!(matches!(
        ds.add_row(vec![MetricValue::Int32(1)]),
        Err(Error::DatasetShapeMismatch { .. })
    ));
    assert!(matches!(
        ds.add_row(vec![MetricValue::Double(1.0), MetricValue::Double(1.0)]),
        Err(Error::DatasetShapeMismatch { .. })
    ));

    let uneven = DataSet::new(["a", "b"], [DataType::Int32]);
    let mut builder = PayloadBuilder::new();
    builder.add("Uneven", uneven);
    assert!(matches!(
        builder.serialize(),
        Err(Error::DatasetShapeMismatch { .. })
    ));
}

#[test]
fn test_property_set_from_mapping() {
    let properties = PropertySet::new()
        .with("engUnit", "Celsius")
        .with("engHigh", 100.0);

    assert_eq!(properties.len(), 2);
    let unit = properties.get("engUnit").unwrap();
    assert_eq!(unit.datatype(), DataType::String);
    assert!(!unit.is_null());
    let high = properties.get("engHigh").unwrap();
    assert_eq!(high.datatype(), DataType::Double);
    assert!(!high.is_null());

    let decoded = round_trip(Metric::new("Sensor/Temperature", 21.5).with_properties(properties));
    let decoded_props = decoded.properties().unwrap();
    assert_eq!(
        decoded_props.get("engUnit").unwrap().as_scalar(),
        Some(&MetricValue::String("Celsius".to_string()))
    );
    assert_eq!(
        decoded_props.get("engHigh").unwrap().as_scalar(),
        Some(&MetricValue::Double(100.0))
    );
}

#[test]
fn test_unsupported_property_value_becomes_typed_null() {
    let properties = PropertySet::new()
        .with("blob", MetricValue::Bytes(vec![1, 2, 3]))
        .with("missing", None::<f64>);

    let blob = properties.get("blob").unwrap();
    assert!(blob.is_null());
    assert_eq!(blob.datatype(), DataType::Bytes);
    assert!(properties.get("missing").unwrap().is_null());

    let decoded = round_trip(Metric::new("m", 1i32).with_properties(properties));
    let blob = decoded.properties().unwrap().get("blob").unwrap();
    assert!(blob.is_null());
    assert_eq!(blob.datatype(), DataType::Bytes);
}

#[test]
fn test_nested_property_set_round_trip() {
    let inner = PropertySet::new().with("min", 0i32).with("max", 10i32);
    let properties = PropertySet::new().with("limits", inner.clone());

    let decoded = round_trip(Metric::new("m", 1i32).with_properties(properties));
    let limits = decoded.properties().unwrap().get("limits").unwrap();
    assert_eq!(limits.datatype(), DataType::PropertySet);
    assert_eq!(limits.value(), Some(&PropertyKind::PropertySet(inner)));
}

#[test]
fn test_property_set_collected_from_pairs() {
    let properties: PropertySet = [
        ("engUnit", PropertyValue::from("Celsius")),
        ("engHigh", 100.0_f64.into()),
        ("x", None::<f64>.into()),
    ]
    .into_iter()
    .collect();

    let keys: Vec<_> = properties.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["engHigh", "engUnit", "x"]);

    let unit = properties.get("engUnit").unwrap();
    assert_eq!(unit.datatype(), DataType::String);
    assert!(!unit.is_null());
    let high = properties.get("engHigh").unwrap();
    assert_eq!(high.datatype(), DataType::Double);
    assert!(!high.is_null());
    let x = properties.get("x").unwrap();
    assert_eq!(x.datatype(), DataType::Unknown);
    assert!(x.is_null());

    let decoded = round_trip(Metric::new("m", 1i32).with_properties(properties.clone()));
    assert_eq!(decoded.properties(), Some(&properties));
}

#[test]
fn test_property_set_list_round_trip() {
    let sets = vec![
        PropertySet::new().with("min", 0i32),
        PropertySet::new().with("max", 10i32).with("unit", "bar"),
    ];
    let properties = PropertySet::new().with("ranges", sets.clone());

    let decoded = round_trip(Metric::new("m", 1i32).with_properties(properties));
    let ranges = decoded.properties().unwrap().get("ranges").unwrap();
    assert_eq!(ranges.datatype(), DataType::PropertySetList);
    assert_eq!(ranges.value(), Some(&PropertyKind::PropertySetList(sets)));
}

#[test]
fn test_dataset_and_template_properties_round_trip() {
    let mut table = DataSet::new(["t", "v"], [DataType::String, DataType::Double]);
    table
        .add_row(vec![MetricValue::from("00:00"), MetricValue::Double(1.5)])
        .unwrap();
    let template = Template::new("v1.0", "Valve", false)
        .with_parameter("size", 40u16)
        .with_metric(Metric::new("Open", true).with_timestamp(1));

    let properties = PropertySet::new()
        .with("history", table.clone())
        .with("model", template.clone());
    let decoded = round_trip(Metric::new("m", 1i32).with_properties(properties));
    let decoded = decoded.properties().unwrap();

    let history = decoded.get("history").unwrap();
    assert_eq!(history.datatype(), DataType::DataSet);
    assert_eq!(history.value(), Some(&PropertyKind::DataSet(table)));

    let model = decoded.get("model").unwrap();
    assert_eq!(model.datatype(), DataType::Template);
    assert_eq!(model.value(), Some(&PropertyKind::Template(template)));
}

#[test]
fn test_uneven_dataset_property_rejected() {
    let uneven = DataSet::new(["a", "b"], [DataType::Int32]);
    let mut builder = PayloadBuilder::new();
    builder.add_metric(
        Metric::new("m", 1i32).with_properties(PropertySet::new().with("table", uneven)),
    );
    assert!(matches!(
        builder.serialize(),
        Err(Error::DatasetShapeMismatch { .. })
    ));
}

#[test]
fn test_template_round_trip() {
    let template = Template::new("v1.0", "Motor", true)
        .with_parameter("ratedRpm", 1800u32)
        .with_parameter("vendor", "ACME")
        .with_metric(Metric::new("Speed", 0.0).with_timestamp(1));

    let decoded = round_trip(Metric::new("Motor", template));
    assert_eq!(decoded.datatype(), DataType::Template);
    match decoded.value() {
        MetricValue::Template(t) => {
            assert_eq!(t.version(), "v1.0");
            assert_eq!(t.template_ref(), "Motor");
            assert!(t.is_definition());
            assert_eq!(t.parameters().len(), 2);
            assert_eq!(t.parameters()[0].datatype(), DataType::UInt32);
            assert_eq!(t.parameters()[0].value(), &MetricValue::UInt32(1800));
            assert_eq!(t.metrics().len(), 1);
            assert_eq!(t.metrics()[0].name(), Some("Speed"));
        }
        other => panic!("Expected Template, got {:?}", other),
    }
}

#[test]
fn test_datatype_mismatch_rejected() {
    let mut builder = PayloadBuilder::new();
    builder.add_metric(Metric::typed("wrong", DataType::Int32, "not a number"));
    assert!(matches!(
        builder.serialize(),
        Err(Error::DatatypeMismatch {
            declared: DataType::Int32,
            actual: DataType::String,
            ..
        })
    ));
}

#[test]
fn test_duplicate_metric_names_rejected() {
    let mut builder = PayloadBuilder::new();
    builder.add_int32("dup", 1).add_int32("dup", 2);
    match builder.serialize() {
        Err(Error::DuplicateMetric { name }) => assert_eq!(name, "dup"),
        other => panic!("Expected DuplicateMetric, got {:?}", other),
    }
}

#[test]
fn test_serialize_empty_payload() {
    let builder = PayloadBuilder::new();
    let bytes = builder.serialize().unwrap();

    // The timestamp alone makes the payload non-empty
    assert!(!bytes.is_empty(), "Serialized payload should not be empty");
}

#[test]
fn test_payload_parse_invalid_data() {
    let invalid_data = vec![0xFF, 0xFF, 0xFF, 0xFF];
    let result = Payload::parse(&invalid_data);

    assert!(result.is_err(), "Should fail to parse invalid data");
    match result {
        Err(Error::ParseFailed(_)) => {
            // Expected error type
        }
        _ => panic!("Expected ParseFailed"),
    }
}

#[test]
fn test_payload_metric_iteration() {
    let mut builder = PayloadBuilder::new();
    builder.add_int32("m1", 1).add_int32("m2", 2).add_int32("m3", 3);

    let bytes = builder.serialize().unwrap();
    let payload = Payload::parse(&bytes).unwrap();

    let names: Vec<_> = payload.metrics().filter_map(Metric::name).collect();
    assert_eq!(names, vec!["m1", "m2", "m3"]);
    assert_eq!(
        payload.metric("m2").map(Metric::value),
        Some(&MetricValue::Int32(2))
    );
    assert!(payload.metric("m4").is_none());
}

#[test]
fn test_payload_invalid_index() {
    let builder = PayloadBuilder::new();
    let bytes = builder.serialize().unwrap();
    let payload = Payload::parse(&bytes).unwrap();

    // Empty payload, index 0 should be invalid
    let result = payload.metric_at(0);
    assert!(result.is_err(), "Should fail for invalid index");

    if let Err(Error::InvalidMetricIndex { index, count }) = result {
        assert_eq!(index, 0);
        assert_eq!(count, 0);
    } else {
        panic!("Expected InvalidMetricIndex, got {:?}", result);
    }
}

#[test]
fn test_timestamp_seq_and_uuid() {
    let mut builder = PayloadBuilder::new();
    builder
        .set_timestamp(1234567890)
        .set_seq(42)
        .set_uuid("abc-123");

    let bytes = builder.serialize().unwrap();
    let payload = Payload::parse(&bytes).unwrap();

    assert_eq!(payload.timestamp(), Some(1234567890));
    assert_eq!(payload.seq(), Some(42));
    assert_eq!(payload.uuid(), Some("abc-123"));
    assert_eq!(payload.body(), None);
}

#[test]
fn test_metrics_by_alias() {
    let mut builder = PayloadBuilder::new();

    // Add by alias only (for NDATA messages)
    builder
        .add_int32_by_alias(1, 100)
        .add_int64_by_alias(2, 200)
        .add_uint32_by_alias(3, 300)
        .add_double_by_alias(6, 6.0)
        .add_bool_by_alias(7, true);

    let bytes = builder.serialize().unwrap();
    let payload = Payload::parse(&bytes).unwrap();
    let first = payload.metric_at(0).unwrap();
    assert_eq!(first.name(), None);
    assert_eq!(first.alias(), Some(1));
    assert_eq!(first.value(), &MetricValue::Int32(100));
}

#[test]
fn test_unicode_strings() {
    let decoded = round_trip(Metric::new("温度", "Hello 世界 🌍"));
    assert_eq!(decoded.name(), Some("温度"));
    assert_eq!(
        decoded.value(),
        &MetricValue::String("Hello 世界 🌍".to_string())
    );
}
