//! Common types for the Sparkplug API.

use crate::dataset::DataSet;
use crate::error::Error;
use crate::template::Template;

/// Sparkplug data types, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataType {
    /// Unknown or unsupported type
    Unknown = 0,
    /// Signed 8-bit integer
    Int8 = 1,
    /// Signed 16-bit integer
    Int16 = 2,
    /// Signed 32-bit integer
    Int32 = 3,
    /// Signed 64-bit integer
    Int64 = 4,
    /// Unsigned 8-bit integer
    UInt8 = 5,
    /// Unsigned 16-bit integer
    UInt16 = 6,
    /// Unsigned 32-bit integer
    UInt32 = 7,
    /// Unsigned 64-bit integer
    UInt64 = 8,
    /// 32-bit floating point
    Float = 9,
    /// 64-bit floating point
    Double = 10,
    /// Boolean value
    Boolean = 11,
    /// String value
    String = 12,
    /// DateTime value (milliseconds since Unix epoch)
    DateTime = 13,
    /// Text value
    Text = 14,
    /// UUID in its string form
    Uuid = 15,
    /// Tabular DataSet
    DataSet = 16,
    /// Opaque byte sequence
    Bytes = 17,
    /// File contents
    File = 18,
    /// Template definition or instance
    Template = 19,
    /// Nested PropertySet (property values only)
    PropertySet = 20,
    /// List of PropertySets (property values only)
    PropertySetList = 21,
}

impl DataType {
    /// Returns the canonical Sparkplug name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Unknown => "Unknown",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::UInt8 => "UInt8",
            DataType::UInt16 => "UInt16",
            DataType::UInt32 => "UInt32",
            DataType::UInt64 => "UInt64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
            DataType::DateTime => "DateTime",
            DataType::Text => "Text",
            DataType::Uuid => "UUID",
            DataType::DataSet => "DataSet",
            DataType::Bytes => "Bytes",
            DataType::File => "File",
            DataType::Template => "Template",
            DataType::PropertySet => "PropertySet",
            DataType::PropertySetList => "PropertySetList",
        }
    }

    /// Looks up a type by its Sparkplug name, falling back to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(DataType::Unknown)
    }

    /// Returns true for integer types of any width or signedness.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }
}

impl From<u32> for DataType {
    fn from(code: u32) -> Self {
        match code {
            1 => DataType::Int8,
            2 => DataType::Int16,
            3 => DataType::Int32,
            4 => DataType::Int64,
            5 => DataType::UInt8,
            6 => DataType::UInt16,
            7 => DataType::UInt32,
            8 => DataType::UInt64,
            9 => DataType::Float,
            10 => DataType::Double,
            11 => DataType::Boolean,
            12 => DataType::String,
            13 => DataType::DateTime,
            14 => DataType::Text,
            15 => DataType::Uuid,
            16 => DataType::DataSet,
            17 => DataType::Bytes,
            18 => DataType::File,
            19 => DataType::Template,
            20 => DataType::PropertySet,
            21 => DataType::PropertySetList,
            _ => DataType::Unknown,
        }
    }
}

impl From<DataType> for u32 {
    fn from(dt: DataType) -> Self {
        dt as u32
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        DataType::from_name(name)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = match s {
            "Unknown" => DataType::Unknown,
            "Int8" => DataType::Int8,
            "Int16" => DataType::Int16,
            "Int32" => DataType::Int32,
            "Int64" => DataType::Int64,
            "UInt8" => DataType::UInt8,
            "UInt16" => DataType::UInt16,
            "UInt32" => DataType::UInt32,
            "UInt64" => DataType::UInt64,
            "Float" => DataType::Float,
            "Double" => DataType::Double,
            "Boolean" => DataType::Boolean,
            "String" => DataType::String,
            "DateTime" => DataType::DateTime,
            "Text" => DataType::Text,
            "UUID" => DataType::Uuid,
            "DataSet" => DataType::DataSet,
            "Bytes" => DataType::Bytes,
            "File" => DataType::File,
            "Template" => DataType::Template,
            "PropertySet" => DataType::PropertySet,
            "PropertySetList" => DataType::PropertySetList,
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "unknown Sparkplug data type: {}",
                    s
                )))
            }
        };
        Ok(dt)
    }
}

/// Metric value type.
///
/// Every variant maps to exactly one [`DataType`]; `Null` carries no value and
/// takes its tag from the owning metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Signed 8-bit integer value
    Int8(i8),
    /// Signed 16-bit integer value
    Int16(i16),
    /// Signed 32-bit integer value
    Int32(i32),
    /// Signed 64-bit integer value
    Int64(i64),
    /// Unsigned 8-bit integer value
    UInt8(u8),
    /// Unsigned 16-bit integer value
    UInt16(u16),
    /// Unsigned 32-bit integer value
    UInt32(u32),
    /// Unsigned 64-bit integer value
    UInt64(u64),
    /// 32-bit floating point value
    Float(f32),
    /// 64-bit floating point value
    Double(f64),
    /// Boolean value
    Boolean(bool),
    /// String value
    String(String),
    /// Text value
    Text(String),
    /// UUID value in string form
    Uuid(String),
    /// DateTime in milliseconds since Unix epoch
    DateTime(u64),
    /// Byte sequence
    Bytes(Vec<u8>),
    /// File contents
    File(Vec<u8>),
    /// Tabular DataSet
    DataSet(DataSet),
    /// Template definition or instance
    Template(Template),
    /// Null value
    Null,
}

impl MetricValue {
    /// Returns the datatype this value is tagged with, or `None` for `Null`.
    pub fn datatype(&self) -> Option<DataType> {
        let dt = match self {
            MetricValue::Int8(_) => DataType::Int8,
            MetricValue::Int16(_) => DataType::Int16,
            MetricValue::Int32(_) => DataType::Int32,
            MetricValue::Int64(_) => DataType::Int64,
            MetricValue::UInt8(_) => DataType::UInt8,
            MetricValue::UInt16(_) => DataType::UInt16,
            MetricValue::UInt32(_) => DataType::UInt32,
            MetricValue::UInt64(_) => DataType::UInt64,
            MetricValue::Float(_) => DataType::Float,
            MetricValue::Double(_) => DataType::Double,
            MetricValue::Boolean(_) => DataType::Boolean,
            MetricValue::String(_) => DataType::String,
            MetricValue::Text(_) => DataType::Text,
            MetricValue::Uuid(_) => DataType::Uuid,
            MetricValue::DateTime(_) => DataType::DateTime,
            MetricValue::Bytes(_) => DataType::Bytes,
            MetricValue::File(_) => DataType::File,
            MetricValue::DataSet(_) => DataType::DataSet,
            MetricValue::Template(_) => DataType::Template,
            MetricValue::Null => return None,
        };
        Some(dt)
    }

    /// Returns true if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }

    /// Returns true for values that fit in a DataSet cell, property or
    /// template parameter: numbers, booleans, strings and datetimes.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            MetricValue::Bytes(_)
                | MetricValue::File(_)
                | MetricValue::DataSet(_)
                | MetricValue::Template(_)
                | MetricValue::Null
        )
    }
}

macro_rules! metric_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for MetricValue {
                fn from(value: $ty) -> Self {
                    MetricValue::$variant(value.into())
                }
            }
        )*
    };
}

metric_value_from! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    DataSet => DataSet,
    Template => Template,
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetricValue::Null, Into::into)
    }
}

/// Current wall-clock time in milliseconds since Unix epoch.
pub(crate) fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
