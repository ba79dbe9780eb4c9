//! Readers: streaming CSV input and Parquet read-back.

pub mod csv;
pub mod parquet;
