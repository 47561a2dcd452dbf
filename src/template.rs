//! Templates: reusable metric schemas and their instances.

use crate::metric::Metric;
use crate::types::{DataType, MetricValue};

/// A named, typed template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    datatype: DataType,
    value: MetricValue,
}

impl Parameter {
    /// Creates a parameter. Non-scalar values become a null parameter that
    /// keeps the type it was given.
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        let value = value.into();
        let datatype = value.datatype().unwrap_or(DataType::Unknown);
        let value = if value.is_scalar() {
            value
        } else {
            MetricValue::Null
        };
        Self {
            name: name.into(),
            datatype,
            value,
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type tag.
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Parameter value (`Null` when unset).
    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    pub(crate) fn from_parts(name: String, datatype: DataType, value: MetricValue) -> Self {
        Self {
            name,
            datatype,
            value,
        }
    }
}

/// A Template definition (schema) or instance.
///
/// Parameters and member metrics can only be added while the template is
/// being built; once it is placed in a metric it is not modified again.
///
/// ```
/// use sparkplug_edge::Template;
///
/// let motor = Template::new("v1.0", "Motor", true)
///     .with_parameter("ratedRpm", 1800u32)
///     .with_parameter("vendor", "ACME");
///
/// assert!(motor.is_definition());
/// assert_eq!(motor.parameters().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    version: String,
    template_ref: String,
    is_definition: bool,
    parameters: Vec<Parameter>,
    metrics: Vec<Metric>,
}

impl Template {
    /// Creates a template with no parameters or metrics.
    pub fn new(
        version: impl Into<String>,
        template_ref: impl Into<String>,
        is_definition: bool,
    ) -> Self {
        Self {
            version: version.into(),
            template_ref: template_ref.into(),
            is_definition,
            parameters: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }

    /// Appends a member metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Template version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name of the definition this template refers to.
    pub fn template_ref(&self) -> &str {
        &self.template_ref
    }

    /// True for a definition, false for an instance.
    pub fn is_definition(&self) -> bool {
        self.is_definition
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Member metrics in declaration order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub(crate) fn from_parts(
        version: String,
        template_ref: String,
        is_definition: bool,
        parameters: Vec<Parameter>,
        metrics: Vec<Metric>,
    ) -> Self {
        Self {
            version,
            template_ref,
            is_definition,
            parameters,
            metrics,
        }
    }
}
