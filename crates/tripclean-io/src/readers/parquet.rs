//! Parquet read-back.
//!
//! Opens a written file with a fresh reader, independent of the writer that
//! produced it. Failures here mean the artifact cannot be confirmed and are
//! reported as `VerificationMismatch`.

use std::fs::File;
use std::path::Path;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type, TimestampMicrosecondType};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType as ArrowType, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use tripclean_core::types::{Column, RowBatch, Scalar};

use crate::error::{readback, Result};

fn open_batches(path: &Path) -> Result<impl Iterator<Item = Result<RecordBatch>> + '_> {
    let file = File::open(path).map_err(|e| readback(path, format!("open: {e}")))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| readback(path, format!("read metadata: {e}")))?
        .build()
        .map_err(|e| readback(path, format!("build reader: {e}")))?;
    Ok(reader.map(move |b| b.map_err(|e| readback(path, format!("decode: {e}")))))
}

/// Count rows by decoding every record batch of the file.
pub fn count_rows(path: &Path) -> Result<u64> {
    let mut n = 0u64;
    for batch in open_batches(path)? {
        n += batch?.num_rows() as u64;
    }
    Ok(n)
}

/// Read the whole file back into a single `RowBatch`.
pub fn read_row_batch(path: &Path) -> Result<RowBatch> {
    let mut out: Option<RowBatch> = None;
    for batch in open_batches(path)? {
        let batch = batch?;
        let converted = from_record_batch(&batch).map_err(|e| readback(path, e))?;
        match out.as_mut() {
            None => out = Some(converted),
            Some(acc) => {
                for (dst, src) in acc.columns.iter_mut().zip(converted.columns) {
                    dst.values.extend(src.values);
                }
            }
        }
    }
    Ok(out.unwrap_or_default())
}

fn from_record_batch(batch: &RecordBatch) -> std::result::Result<RowBatch, String> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let values: Vec<Scalar> = match field.data_type() {
            ArrowType::Boolean => {
                let a = array.as_boolean();
                (0..a.len())
                    .map(|i| if a.is_null(i) { Scalar::Null } else { Scalar::Bool(a.value(i)) })
                    .collect()
            }
            ArrowType::Int64 => {
                let a = array.as_primitive::<Int64Type>();
                (0..a.len())
                    .map(|i| if a.is_null(i) { Scalar::Null } else { Scalar::I64(a.value(i)) })
                    .collect()
            }
            ArrowType::Float64 => {
                let a = array.as_primitive::<Float64Type>();
                (0..a.len())
                    .map(|i| if a.is_null(i) { Scalar::Null } else { Scalar::F64(a.value(i)) })
                    .collect()
            }
            ArrowType::Utf8 => {
                let a = array.as_string::<i32>();
                (0..a.len())
                    .map(|i| {
                        if a.is_null(i) {
                            Scalar::Null
                        } else {
                            Scalar::Str(a.value(i).to_string())
                        }
                    })
                    .collect()
            }
            ArrowType::Timestamp(TimeUnit::Microsecond, _) => {
                let a = array.as_primitive::<TimestampMicrosecondType>();
                (0..a.len())
                    .map(|i| {
                        if a.is_null(i) {
                            Scalar::Null
                        } else {
                            Scalar::Timestamp(a.value(i))
                        }
                    })
                    .collect()
            }
            other => return Err(format!("unsupported column type {other} for '{}'", field.name())),
        };
        columns.push(Column::new(field.name().clone(), values));
    }
    Ok(RowBatch::new(columns))
}
