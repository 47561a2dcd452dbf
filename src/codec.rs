//! Conversions between the domain types and their protobuf wire form.
//!
//! Integers of every width travel in the 64-bit `long_value` slot, widened
//! from their signed or unsigned source; the datatype tag alone records the
//! declared width. Decoding never fails: a missing value, an unknown tag or
//! a value slot that disagrees with the tag decodes as null.

use crate::dataset::DataSet;
use crate::metric::Metric;
use crate::property::{PropertyKind, PropertySet, PropertyValue};
use crate::proto::payload as pb;
use crate::template::{Parameter, Template};
use crate::types::{DataType, MetricValue};

/// The value slots shared by every Sparkplug oneof.
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Long(u64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Str(String),
}

macro_rules! scalar_oneof {
    ($($module:tt)*) => {
        impl From<Scalar> for pb::$($module)*::Value {
            fn from(scalar: Scalar) -> Self {
                match scalar {
                    Scalar::Long(v) => Self::LongValue(v),
                    Scalar::Float(v) => Self::FloatValue(v),
                    Scalar::Double(v) => Self::DoubleValue(v),
                    Scalar::Boolean(v) => Self::BooleanValue(v),
                    Scalar::Str(v) => Self::StringValue(v),
                }
            }
        }

        impl TryFrom<pb::$($module)*::Value> for Scalar {
            type Error = pb::$($module)*::Value;

            #[allow(unreachable_patterns)]
            fn try_from(
                value: pb::$($module)*::Value,
            ) -> ::std::result::Result<Self, Self::Error> {
                use crate::proto::payload::$($module)*::Value;
                match value {
                    // 32-bit slot: sign-extend, narrowing later keeps the low bits.
                    Value::IntValue(v) => Ok(Scalar::Long(v as i32 as i64 as u64)),
                    Value::LongValue(v) => Ok(Scalar::Long(v)),
                    Value::FloatValue(v) => Ok(Scalar::Float(v)),
                    Value::DoubleValue(v) => Ok(Scalar::Double(v)),
                    Value::BooleanValue(v) => Ok(Scalar::Boolean(v)),
                    Value::StringValue(v) => Ok(Scalar::Str(v)),
                    other => Err(other),
                }
            }
        }
    };
}

scalar_oneof!(metric);
scalar_oneof!(property_value);
scalar_oneof!(data_set::data_set_value);
scalar_oneof!(template::parameter);

fn encode_scalar(value: &MetricValue) -> Option<Scalar> {
    let scalar = match value {
        MetricValue::Int8(v) => Scalar::Long(i64::from(*v) as u64),
        MetricValue::Int16(v) => Scalar::Long(i64::from(*v) as u64),
        MetricValue::Int32(v) => Scalar::Long(i64::from(*v) as u64),
        MetricValue::Int64(v) => Scalar::Long(*v as u64),
        MetricValue::UInt8(v) => Scalar::Long(u64::from(*v)),
        MetricValue::UInt16(v) => Scalar::Long(u64::from(*v)),
        MetricValue::UInt32(v) => Scalar::Long(u64::from(*v)),
        MetricValue::UInt64(v) => Scalar::Long(*v),
        MetricValue::DateTime(v) => Scalar::Long(*v),
        MetricValue::Float(v) => Scalar::Float(*v),
        MetricValue::Double(v) => Scalar::Double(*v),
        MetricValue::Boolean(v) => Scalar::Boolean(*v),
        MetricValue::String(v) | MetricValue::Text(v) | MetricValue::Uuid(v) => {
            Scalar::Str(v.clone())
        }
        MetricValue::Bytes(_)
        | MetricValue::File(_)
        | MetricValue::DataSet(_)
        | MetricValue::Template(_)
        | MetricValue::Null => return None,
    };
    Some(scalar)
}

fn decode_scalar(datatype: DataType, scalar: Scalar) -> MetricValue {
    match (datatype, scalar) {
        (DataType::Int8, Scalar::Long(v)) => MetricValue::Int8(v as i8),
        (DataType::Int16, Scalar::Long(v)) => MetricValue::Int16(v as i16),
        (DataType::Int32, Scalar::Long(v)) => MetricValue::Int32(v as i32),
        (DataType::Int64, Scalar::Long(v)) => MetricValue::Int64(v as i64),
        (DataType::UInt8, Scalar::Long(v)) => MetricValue::UInt8(v as u8),
        (DataType::UInt16, Scalar::Long(v)) => MetricValue::UInt16(v as u16),
        (DataType::UInt32, Scalar::Long(v)) => MetricValue::UInt32(v as u32),
        (DataType::UInt64, Scalar::Long(v)) => MetricValue::UInt64(v),
        (DataType::DateTime, Scalar::Long(v)) => MetricValue::DateTime(v),
        (DataType::Float, Scalar::Float(v)) => MetricValue::Float(v),
        (DataType::Double, Scalar::Double(v)) => MetricValue::Double(v),
        (DataType::Boolean, Scalar::Boolean(v)) => MetricValue::Boolean(v),
        (DataType::String, Scalar::Str(v)) => MetricValue::String(v),
        (DataType::Text, Scalar::Str(v)) => MetricValue::Text(v),
        (DataType::Uuid, Scalar::Str(v)) => MetricValue::Uuid(v),
        _ => MetricValue::Null,
    }
}

pub(crate) fn encode_metric(metric: &Metric) -> pb::Metric {
    use crate::proto::payload::metric::Value;

    let value = match metric.value() {
        MetricValue::Bytes(b) | MetricValue::File(b) => Some(Value::BytesValue(b.clone())),
        MetricValue::DataSet(ds) => Some(Value::DatasetValue(encode_dataset(ds))),
        MetricValue::Template(t) => Some(Value::TemplateValue(encode_template(t))),
        other => encode_scalar(other).map(Into::into),
    };

    pb::Metric {
        name: metric.name().map(str::to_owned),
        alias: metric.alias(),
        timestamp: metric.timestamp(),
        datatype: Some(metric.datatype().into()),
        is_historical: metric.is_historical().then_some(true),
        is_transient: metric.is_transient().then_some(true),
        is_null: metric.is_null().then_some(true),
        metadata: None,
        properties: metric.properties().map(encode_property_set),
        value,
    }
}

pub(crate) fn decode_metric(metric: pb::Metric) -> Metric {
    use crate::proto::payload::metric::Value;

    let datatype = DataType::from(metric.datatype.unwrap_or_default());
    let value = match metric.value {
        _ if metric.is_null == Some(true) => MetricValue::Null,
        None => MetricValue::Null,
        Some(Value::BytesValue(b)) => match datatype {
            DataType::Bytes => MetricValue::Bytes(b),
            DataType::File => MetricValue::File(b),
            _ => MetricValue::Null,
        },
        Some(Value::DatasetValue(ds)) if datatype == DataType::DataSet => {
            MetricValue::DataSet(decode_dataset(ds))
        }
        Some(Value::TemplateValue(t)) if datatype == DataType::Template => {
            MetricValue::Template(decode_template(t))
        }
        Some(other) => {
            Scalar::try_from(other).map_or(MetricValue::Null, |s| decode_scalar(datatype, s))
        }
    };

    Metric::from_parts(
        metric.name,
        metric.alias,
        metric.timestamp,
        datatype,
        value,
        metric.properties.map(decode_property_set),
        metric.is_historical.unwrap_or(false),
        metric.is_transient.unwrap_or(false),
    )
}

fn encode_dataset(ds: &DataSet) -> pb::DataSet {
    pb::DataSet {
        num_of_columns: Some(ds.num_of_columns()),
        columns: ds.columns().to_vec(),
        types: ds.types().iter().map(|t| u32::from(*t)).collect(),
        rows: ds
            .rows()
            .iter()
            .map(|row| pb::data_set::Row {
                elements: row
                    .iter()
                    .map(|cell| pb::data_set::DataSetValue {
                        value: encode_scalar(cell).map(Into::into),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn decode_dataset(ds: pb::DataSet) -> DataSet {
    let types: Vec<DataType> = ds.types.into_iter().map(DataType::from).collect();
    let rows = ds
        .rows
        .into_iter()
        .map(|row| {
            row.elements
                .into_iter()
                .enumerate()
                .map(|(column, cell)| {
                    let datatype = types.get(column).copied().unwrap_or(DataType::Unknown);
                    cell.value
                        .and_then(|v| Scalar::try_from(v).ok())
                        .map_or(MetricValue::Null, |s| decode_scalar(datatype, s))
                })
                .collect()
        })
        .collect();
    DataSet::from_parts(ds.columns, types, rows)
}

fn encode_template(template: &Template) -> pb::Template {
    pb::Template {
        version: Some(template.version().to_owned()),
        metrics: template.metrics().iter().map(encode_metric).collect(),
        parameters: template
            .parameters()
            .iter()
            .map(|p| pb::template::Parameter {
                name: Some(p.name().to_owned()),
                r#type: Some(p.datatype().into()),
                value: encode_scalar(p.value()).map(Into::into),
            })
            .collect(),
        template_ref: Some(template.template_ref().to_owned()),
        is_definition: Some(template.is_definition()),
    }
}

fn decode_template(template: pb::Template) -> Template {
    let parameters = template
        .parameters
        .into_iter()
        .map(|p| {
            let datatype = DataType::from(p.r#type.unwrap_or_default());
            let value = p
                .value
                .and_then(|v| Scalar::try_from(v).ok())
                .map_or(MetricValue::Null, |s| decode_scalar(datatype, s));
            Parameter::from_parts(p.name.unwrap_or_default(), datatype, value)
        })
        .collect();

    Template::from_parts(
        template.version.unwrap_or_default(),
        template.template_ref.unwrap_or_default(),
        template.is_definition.unwrap_or(false),
        parameters,
        template.metrics.into_iter().map(decode_metric).collect(),
    )
}

fn encode_property_set(set: &PropertySet) -> pb::PropertySet {
    let (keys, values) = set
        .iter()
        .map(|(key, value)| (key.to_owned(), encode_property_value(value)))
        .unzip();
    pb::PropertySet { keys, values }
}

fn encode_property_value(property: &PropertyValue) -> pb::PropertyValue {
    use crate::proto::payload::property_value::Value;

    let value = match property.value() {
        None => None,
        Some(PropertyKind::Value(v)) => encode_scalar(v).map(Into::into),
        Some(PropertyKind::PropertySet(set)) => {
            Some(Value::PropertysetValue(encode_property_set(set)))
        }
        Some(PropertyKind::PropertySetList(sets)) => {
            Some(Value::PropertysetsValue(pb::PropertySetList {
                propertyset: sets.iter().map(encode_property_set).collect(),
            }))
        }
        Some(PropertyKind::DataSet(ds)) => Some(Value::DatasetValue(encode_dataset(ds))),
        Some(PropertyKind::Template(t)) => Some(Value::TemplateValue(encode_template(t))),
    };

    pb::PropertyValue {
        r#type: Some(property.datatype().into()),
        is_null: value.is_none().then_some(true),
        value,
    }
}

fn decode_property_set(set: pb::PropertySet) -> PropertySet {
    set.keys
        .into_iter()
        .zip(set.values)
        .map(|(key, value)| (key, decode_property_value(value)))
        .collect()
}

fn decode_property_value(property: pb::PropertyValue) -> PropertyValue {
    use crate::proto::payload::property_value::Value;

    let datatype = DataType::from(property.r#type.unwrap_or_default());
    let value = match property.value {
        _ if property.is_null == Some(true) => None,
        None => None,
        Some(Value::PropertysetValue(set)) if datatype == DataType::PropertySet => {
            Some(PropertyKind::PropertySet(decode_property_set(set)))
        }
        Some(Value::PropertysetsValue(list)) if datatype == DataType::PropertySetList => Some(
            PropertyKind::PropertySetList(
                list.propertyset
                    .into_iter()
                    .map(decode_property_set)
                    .collect(),
            ),
        ),
        Some(Value::DatasetValue(ds)) if datatype == DataType::DataSet => {
            Some(PropertyKind::DataSet(decode_dataset(ds)))
        }
        Some(Value::TemplateValue(t)) if datatype == DataType::Template => {
            Some(PropertyKind::Template(decode_template(t)))
        }
        Some(other) => Scalar::try_from(other)
            .ok()
            .map(|s| decode_scalar(datatype, s))
            .filter(|v| !v.is_null())
            .map(PropertyKind::Value),
    };

    PropertyValue::from_parts(datatype, value)
}
