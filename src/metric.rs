//! Named, typed, timestamped metrics.

use crate::error::{Error, Result};
use crate::property::PropertySet;
use crate::types::{now_millis, DataType, MetricValue};

/// A single Sparkplug metric.
///
/// The datatype tag and the carried value always agree unless the metric was
/// built with [`Metric::typed`], in which case [`Metric::validate`] (run when
/// a payload is serialized) reports the disagreement.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: Option<String>,
    alias: Option<u64>,
    timestamp: Option<u64>,
    datatype: DataType,
    value: MetricValue,
    properties: Option<PropertySet>,
    is_historical: bool,
    is_transient: bool,
}

impl Metric {
    /// Creates a metric whose tag follows the value's kind, stamped with the
    /// current time. A `Null` value yields a null metric tagged `Unknown`.
    ///
    /// Integers narrower than 64 bits keep their declared width in the tag;
    /// on the wire they travel widened to 64 bits.
    ///
    /// ```
    /// use sparkplug_edge::{DataType, Metric, MetricValue};
    ///
    /// let m = Metric::new("Status/Battery", 85u8);
    /// assert_eq!(m.datatype(), DataType::UInt8);
    /// assert_eq!(m.value(), &MetricValue::UInt8(85));
    /// ```
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        let value = value.into();
        Self {
            name: Some(name.into()),
            alias: None,
            timestamp: Some(now_millis()),
            datatype: value.datatype().unwrap_or(DataType::Unknown),
            value,
            properties: None,
            is_historical: false,
            is_transient: false,
        }
    }

    /// Creates a metric with an explicitly declared tag.
    pub fn typed(name: impl Into<String>, datatype: DataType, value: impl Into<MetricValue>) -> Self {
        Self {
            datatype,
            ..Self::new(name, value)
        }
    }

    /// Creates a null metric of the given type.
    pub fn null(name: impl Into<String>, datatype: DataType) -> Self {
        Self::typed(name, datatype, MetricValue::Null)
    }

    /// Creates an alias-only metric, for data messages after a birth has
    /// declared the alias.
    pub fn by_alias(alias: u64, value: impl Into<MetricValue>) -> Self {
        let mut metric = Self::new(String::new(), value);
        metric.name = None;
        metric.alias = Some(alias);
        metric
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: u64) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Overrides the timestamp (milliseconds since Unix epoch).
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attaches metadata properties.
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Marks the metric as historical.
    pub fn historical(mut self) -> Self {
        self.is_historical = true;
        self
    }

    /// Marks the metric as transient.
    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    /// Metric name (if present).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Metric alias (if present).
    pub fn alias(&self) -> Option<u64> {
        self.alias
    }

    /// Metric timestamp in milliseconds since Unix epoch (if present).
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Datatype tag.
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Metric value (or `Null`).
    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    /// Attached properties, if any.
    pub fn properties(&self) -> Option<&PropertySet> {
        self.properties.as_ref()
    }

    /// Returns true for a null metric.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Historical flag.
    pub fn is_historical(&self) -> bool {
        self.is_historical
    }

    /// Transient flag.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    /// Checks tag/value agreement and the shape of nested DataSets and
    /// Templates.
    pub fn validate(&self) -> Result<()> {
        if let Some(actual) = self.value.datatype() {
            if actual != self.datatype {
                return Err(Error::DatatypeMismatch {
                    metric: self.label(),
                    declared: self.datatype,
                    actual,
                });
            }
        }

        if let Some(properties) = &self.properties {
            properties.validate()?;
        }

        match &self.value {
            MetricValue::DataSet(ds) => ds.validate(),
            MetricValue::Template(t) => t.metrics().iter().try_for_each(Metric::validate),
            _ => Ok(()),
        }
    }

    /// Name, or `alias N` for alias-only metrics.
    pub(crate) fn label(&self) -> String {
        match (&self.name, self.alias) {
            (Some(name), _) => name.clone(),
            (None, Some(alias)) => format!("alias {}", alias),
            (None, None) => "<unnamed>".to_string(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        name: Option<String>,
        alias: Option<u64>,
        timestamp: Option<u64>,
        datatype: DataType,
        value: MetricValue,
        properties: Option<PropertySet>,
        is_historical: bool,
        is_transient: bool,
    ) -> Self {
        Self {
            name,
            alias,
            timestamp,
            datatype,
            value,
            properties,
            is_historical,
            is_transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSet;
    use crate::template::Template;

    #[test]
    fn test_tag_follows_value() {
        assert_eq!(Metric::new("a", 1i16).datatype(), DataType::Int16);
        assert_eq!(Metric::new("b", 1.5f32).datatype(), DataType::Float);
        assert_eq!(Metric::new("c", vec![0u8; 4]).datatype(), DataType::Bytes);
        assert!(Metric::new("c", vec![0u8; 4]).timestamp().is_some());
    }

    #[test]
    fn test_null_value_is_null_metric() {
        let m = Metric::new("missing", None::<i32>);
        assert!(m.is_null());
        assert_eq!(m.datatype(), DataType::Unknown);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_typed_mismatch_fails_validation() {
        let m = Metric::typed("Status/Battery", DataType::Int32, 85i64);
        assert!(matches!(
            m.validate(),
            Err(Error::DatatypeMismatch {
                declared: DataType::Int32,
                actual: DataType::Int64,
                ..
            })
        ));
    }

    #[test]
    fn test_nested_dataset_checked() {
        let ds = DataSet::new(["a", "b"], [DataType::Int32]);
        assert!(Metric::new("ds", ds).validate().is_err());
    }

    #[test]
    fn test_nested_template_metrics_checked() {
        let t = Template::new("v1", "Motor", true)
            .with_metric(Metric::typed("rpm", DataType::Double, 1u32));
        assert!(Metric::new("motor", t).validate().is_err());
    }

    #[test]
    fn test_alias_only() {
        let m = Metric::by_alias(7, true);
        assert_eq!(m.name(), None);
        assert_eq!(m.alias(), Some(7));
        assert_eq!(m.label(), "alias 7");
    }
}
