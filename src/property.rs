//! PropertySets: keyed metadata attached to metrics.

use crate::dataset::DataSet;
use crate::error::Result;
use crate::metric::Metric;
use crate::template::Template;
use crate::types::{DataType, MetricValue};
use std::collections::BTreeMap;

/// The value side of a property entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// A scalar value (number, boolean, string or datetime)
    Value(MetricValue),
    /// A nested PropertySet
    PropertySet(PropertySet),
    /// A list of PropertySets
    PropertySetList(Vec<PropertySet>),
    /// A DataSet
    DataSet(DataSet),
    /// A Template
    Template(Template),
}

/// A single typed property value, or a typed null.
///
/// Values a property cannot carry (bytes and files) are kept as a null entry
/// that still reports the type they were given, so a reader can tell an
/// absent value from a dropped one.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    datatype: DataType,
    value: Option<PropertyKind>,
}

impl PropertyValue {
    /// Creates a property from any metric value.
    pub fn new(value: impl Into<MetricValue>) -> Self {
        let value = value.into();
        let Some(datatype) = value.datatype() else {
            return Self::null(DataType::Unknown);
        };
        let value = match value {
            MetricValue::DataSet(ds) => PropertyKind::DataSet(ds),
            MetricValue::Template(t) => PropertyKind::Template(t),
            scalar if scalar.is_scalar() => PropertyKind::Value(scalar),
            _ => return Self::null(datatype),
        };
        Self {
            datatype,
            value: Some(value),
        }
    }

    /// Creates a null property of the given type.
    pub fn null(datatype: DataType) -> Self {
        Self {
            datatype,
            value: None,
        }
    }

    /// The property's type tag.
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// The property's value, or `None` when null.
    pub fn value(&self) -> Option<&PropertyKind> {
        self.value.as_ref()
    }

    /// Returns the scalar value, if this property holds one.
    pub fn as_scalar(&self) -> Option<&MetricValue> {
        match &self.value {
            Some(PropertyKind::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns true when no value is carried.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub(crate) fn from_parts(datatype: DataType, value: Option<PropertyKind>) -> Self {
        Self { datatype, value }
    }

    fn validate(&self) -> Result<()> {
        match &self.value {
            Some(PropertyKind::PropertySet(set)) => set.validate(),
            Some(PropertyKind::PropertySetList(sets)) => {
                sets.iter().try_for_each(PropertySet::validate)
            }
            Some(PropertyKind::DataSet(ds)) => ds.validate(),
            Some(PropertyKind::Template(t)) => t.metrics().iter().try_for_each(Metric::validate),
            Some(PropertyKind::Value(_)) | None => Ok(()),
        }
    }
}

macro_rules! property_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::new(value)
                }
            }
        )*
    };
}

property_value_from!(
    i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, String, &str, MetricValue, DataSet, Template,
);

impl From<PropertySet> for PropertyValue {
    fn from(set: PropertySet) -> Self {
        Self {
            datatype: DataType::PropertySet,
            value: Some(PropertyKind::PropertySet(set)),
        }
    }
}

impl From<Vec<PropertySet>> for PropertyValue {
    fn from(sets: Vec<PropertySet>) -> Self {
        Self {
            datatype: DataType::PropertySetList,
            value: Some(PropertyKind::PropertySetList(sets)),
        }
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(|| PropertyValue::null(DataType::Unknown), Into::into)
    }
}

/// A set of uniquely keyed properties. Key order carries no meaning; entries
/// are kept sorted so encoding is stable.
///
/// # Example
///
/// ```
/// use sparkplug_edge::{DataType, PropertySet};
///
/// let props = PropertySet::new()
///     .with("engUnit", "Celsius")
///     .with("engHigh", 100.0);
///
/// assert_eq!(props.get("engUnit").map(|p| p.datatype()), Some(DataType::String));
/// assert_eq!(props.get("engHigh").map(|p| p.datatype()), Some(DataType::Double));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet {
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertySet {
    /// Creates an empty PropertySet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property, returning the set for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a property, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Looks up a property by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Checks DataSet shapes and template members held anywhere in the set.
    pub(crate) fn validate(&self) -> Result<()> {
        self.properties.values().try_for_each(PropertyValue::validate)
    }
}

impl<K, V> FromIterator<(K, V)> for PropertySet
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
