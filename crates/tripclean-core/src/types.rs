//! Lightweight logical value/column containers to avoid bringing Arrow into core.
//!
//! Operators work on `RowBatch` blocks; the sink converts them to Arrow arrays.

use serde::{Deserialize, Serialize};

use crate::schema::DataType;
use crate::temporal::format_timestamp_micros;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    /// Epoch microseconds, no time zone.
    Timestamp(i64),
}

impl Scalar {
    /// Logical type of a non-null value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text rendering used when a non-string value is fed to a string function.
    pub fn render(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::I64(i) => Some(i.to_string()),
            Scalar::F64(f) => Some(f.to_string()),
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Timestamp(us) => Some(format_timestamp_micros(*us)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A block of rows stored column by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Keep only the rows whose `keep` flag is set, in order.
    ///
    /// Every column is filtered with the same mask, so row alignment holds.
    pub fn retain(&self, keep: &[bool]) -> Result<RowBatch, String> {
        if keep.len() != self.num_rows() {
            return Err(format!(
                "mask length {} does not match row count {}",
                keep.len(),
                self.num_rows()
            ));
        }
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                values: col
                    .values
                    .iter()
                    .zip(keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.clone())
                    .collect(),
            })
            .collect();
        Ok(RowBatch { columns })
    }
}
