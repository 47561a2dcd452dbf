//! Tabular DataSet metric values.

use crate::error::{Error, Result};
use crate::types::{DataType, MetricValue};

/// A table of typed columns carried as a single metric value.
///
/// Columns and their types are fixed when the DataSet is created; rows are
/// appended afterwards and checked against the columns as they go in.
///
/// # Example
///
/// ```
/// use sparkplug_edge::{DataSet, DataType, MetricValue};
///
/// let mut ds = DataSet::new(["timestamp", "value"], [DataType::String, DataType::Double]);
/// ds.add_row(vec![MetricValue::from("2024-01-01T00:00:00Z"), MetricValue::Double(1.5)])?;
/// assert_eq!(ds.num_of_columns(), 2);
/// assert_eq!(ds.row_count(), 1);
/// # Ok::<(), sparkplug_edge::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    columns: Vec<String>,
    types: Vec<DataType>,
    rows: Vec<Vec<MetricValue>>,
}

impl DataSet {
    /// Creates an empty DataSet from parallel column-name and column-type lists.
    ///
    /// Types may be given as [`DataType`] values or as Sparkplug type names
    /// (`"Int32"`, `"Double"`, ...). The lists are expected to be the same
    /// length; a mismatch is reported by [`DataSet::validate`] and by every
    /// `add_row` call rather than here.
    pub fn new<C, T>(
        columns: impl IntoIterator<Item = C>,
        types: impl IntoIterator<Item = T>,
    ) -> Self
    where
        C: Into<String>,
        T: Into<DataType>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            types: types.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of columns, as reported on the wire.
    pub fn num_of_columns(&self) -> u64 {
        self.columns.len() as u64
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column types in order.
    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Rows appended so far.
    pub fn rows(&self) -> &[Vec<MetricValue>] {
        &self.rows
    }

    /// Number of rows appended so far.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row, rejecting it if its arity or cell kinds do not match the
    /// columns. `Null` cells are accepted in any column.
    pub fn add_row(&mut self, row: Vec<MetricValue>) -> Result<&mut Self> {
        self.check_header()?;
        self.check_row(self.rows.len(), &row)?;
        self.rows.push(row);
        Ok(self)
    }

    /// Checks the whole table: header lengths and every row.
    pub fn validate(&self) -> Result<()> {
        self.check_header()?;
        for (index, row) in self.rows.iter().enumerate() {
            self.check_row(index, row)?;
        }
        Ok(())
    }

    /// Reassembles a DataSet from already-decoded parts without re-checking it.
    pub(crate) fn from_parts(
        columns: Vec<String>,
        types: Vec<DataType>,
        rows: Vec<Vec<MetricValue>>,
    ) -> Self {
        Self {
            columns,
            types,
            rows,
        }
    }

    fn check_header(&self) -> Result<()> {
        if self.columns.len() != self.types.len() {
            return Err(Error::DatasetShapeMismatch {
                details: format!(
                    "{} columns but {} column types",
                    self.columns.len(),
                    self.types.len()
                ),
            });
        }
        Ok(())
    }

    fn check_row(&self, index: usize, row: &[MetricValue]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::DatasetShapeMismatch {
                details: format!(
                    "row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    self.columns.len()
                ),
            });
        }

        for ((cell, column), expected) in row.iter().zip(&self.columns).zip(&self.types) {
            if cell.is_null() {
                continue;
            }
            if !cell.is_scalar() || cell.datatype() != Some(*expected) {
                return Err(Error::DatasetShapeMismatch {
                    details: format!(
                        "row {} column '{}' expects {}, got {}",
                        index,
                        column,
                        expected,
                        cell.datatype().unwrap_or(DataType::Unknown)
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_resolve() {
        let ds = DataSet::new(["a", "b", "c"], ["String", "Double", "Int32"]);
        assert_eq!(
            ds.types(),
            &[DataType::String, DataType::Double, DataType::Int32]
        );
    }

    #[test]
    fn test_unknown_type_name_is_unknown() {
        let ds = DataSet::new(["a"], ["NotAType"]);
        assert_eq!(ds.types(), &[DataType::Unknown]);
    }

    #[test]
    fn test_null_cell_accepted() {
        let mut ds = DataSet::new(["a", "b"], [DataType::Int32, DataType::Boolean]);
        assert!(ds.add_row(vec![MetricValue::Null, MetricValue::Boolean(true)]).is_ok());
    }

    #[test]
    fn test_header_mismatch_rejects_rows() {
        let mut ds = DataSet::new(["a", "b"], [DataType::Int32]);
        assert_eq!(ds.num_of_columns(), 2);
        let result = ds.add_row(vec![MetricValue::Int32(1), MetricValue::Int32(2)]);
        assert!(matches!(result, Err(Error::DatasetShapeMismatch { .. })));
        assert!(ds.validate().is_err());
    }

    #[test]
    fn test_bytes_cell_rejected() {
        let mut ds = DataSet::new(["blob"], [DataType::Bytes]);
        let result = ds.add_row(vec![MetricValue::Bytes(vec![1, 2, 3])]);
        assert!(matches!(result, Err(Error::DatasetShapeMismatch { .. })));
    }
}
