//! Parquet sink with atomic publish.
//!
//! Rows are written to a hidden temp file next to the destination and renamed
//! over it only after the writer has been closed and synced. The temp file is
//! removed on every other exit path, so a failed run leaves nothing visible.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow_schema::{DataType as ArrowType, Field as ArrowField, Schema as ArrowSchema, SchemaRef, TimeUnit};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{debug, warn};
use uuid::Uuid;

use tripclean_core::schema::{DataType, Schema};
use tripclean_core::types::{RowBatch, Scalar};

use crate::error::{write, Result};

/// Map a logical type onto its Arrow counterpart.
pub fn arrow_type(dt: DataType) -> ArrowType {
    match dt {
        DataType::Boolean => ArrowType::Boolean,
        DataType::Int64 => ArrowType::Int64,
        DataType::Float64 => ArrowType::Float64,
        DataType::Utf8 => ArrowType::Utf8,
        DataType::Timestamp => ArrowType::Timestamp(TimeUnit::Microsecond, None),
    }
}

pub fn to_arrow_schema(schema: &Schema) -> SchemaRef {
    Arc::new(ArrowSchema::new(
        schema
            .fields
            .iter()
            .map(|f| ArrowField::new(f.name.clone(), arrow_type(f.data_type), f.nullable))
            .collect::<Vec<_>>(),
    ))
}

fn mismatch(column: &str, expected: DataType, got: &Scalar) -> String {
    format!(
        "column '{column}': expected {expected}, got {}",
        got.data_type().map(|d| d.to_string()).unwrap_or_else(|| "NULL".into())
    )
}

fn build_array(column: &str, dt: DataType, values: &[Scalar]) -> std::result::Result<ArrayRef, String> {
    macro_rules! collect {
        ($variant:ident, $array:ty) => {{
            let vals = values
                .iter()
                .map(|v| match v {
                    Scalar::Null => Ok(None),
                    Scalar::$variant(x) => Ok(Some(x.clone())),
                    other => Err(mismatch(column, dt, other)),
                })
                .collect::<std::result::Result<Vec<_>, String>>()?;
            Arc::new(<$array>::from(vals)) as ArrayRef
        }};
    }
    Ok(match dt {
        DataType::Boolean => collect!(Bool, BooleanArray),
        DataType::Int64 => collect!(I64, Int64Array),
        DataType::Float64 => collect!(F64, Float64Array),
        DataType::Utf8 => collect!(Str, StringArray),
        DataType::Timestamp => collect!(Timestamp, TimestampMicrosecondArray),
    })
}

/// Convert a `RowBatch` into an Arrow `RecordBatch` laid out as `schema`.
pub fn to_record_batch(batch: &RowBatch, schema: &Schema, arrow: SchemaRef) -> std::result::Result<RecordBatch, String> {
    if batch.columns.len() != schema.len() {
        return Err(format!(
            "batch has {} columns, sink schema has {}",
            batch.columns.len(),
            schema.len()
        ));
    }
    let mut arrays = Vec::with_capacity(schema.len());
    for (field, col) in schema.fields.iter().zip(&batch.columns) {
        if field.name != col.name {
            return Err(format!(
                "column order mismatch: expected '{}', got '{}'",
                field.name, col.name
            ));
        }
        arrays.push(build_array(&field.name, field.data_type, &col.values)?);
    }
    RecordBatch::try_new(arrow, arrays).map_err(|e| e.to_string())
}

/// Temp file that is deleted on drop unless committed.
pub struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Reserve a hidden temp path in the same directory as `dest`.
    pub fn beside(dest: &Path) -> Result<Self> {
        let name = dest
            .file_name()
            .ok_or_else(|| write(dest, "destination has no file name"))?
            .to_string_lossy();
        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.is_dir() {
            return Err(write(dest, format!("parent directory {} does not exist", dir.display())));
        }
        Ok(Self {
            path: dir.join(format!(".{name}.{}.tmp", Uuid::new_v4().simple())),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically move the staged file over `dest`.
    pub fn commit(mut self, dest: &Path) -> Result<()> {
        fs::rename(&self.path, dest).map_err(|e| write(dest, format!("rename: {e}")))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

/// Single-file Parquet writer fed with `RowBatch` blocks.
pub struct ParquetWriter {
    dest: PathBuf,
    schema: Schema,
    arrow: SchemaRef,
    writer: ArrowWriter<File>,
    file: File,
    staged: StagedFile,
    rows: u64,
}

impl ParquetWriter {
    /// Open a staged writer for `dest` with the given output schema.
    ///
    /// The parent directory must already exist.
    pub fn create(dest: &Path, schema: &Schema) -> Result<Self> {
        let staged = StagedFile::beside(dest)?;
        let file = File::create(staged.path())
            .map_err(|e| write(staged.path(), format!("create: {e}")))?;
        let arrow = to_arrow_schema(schema);
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let handle = file
            .try_clone()
            .map_err(|e| write(staged.path(), format!("clone handle: {e}")))?;
        let writer = ArrowWriter::try_new(handle, arrow.clone(), Some(props))
            .map_err(|e| write(dest, format!("open parquet writer: {e}")))?;
        debug!(dest = %dest.display(), staged = %staged.path().display(), "opened parquet writer");
        Ok(Self {
            dest: dest.to_path_buf(),
            schema: schema.clone(),
            arrow,
            writer,
            file,
            staged,
            rows: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn write_batch(&mut self, batch: &RowBatch) -> Result<()> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        let rb = to_record_batch(batch, &self.schema, self.arrow.clone())
            .map_err(|e| write(&self.dest, e))?;
        self.writer
            .write(&rb)
            .map_err(|e| write(&self.dest, format!("write batch: {e}")))?;
        self.rows += batch.num_rows() as u64;
        Ok(())
    }

    /// Close the writer, sync, and publish the file at its destination.
    ///
    /// Returns the number of rows written.
    pub fn finish(self) -> Result<u64> {
        let ParquetWriter {
            dest,
            writer,
            file,
            staged,
            rows,
            ..
        } = self;
        writer
            .close()
            .map_err(|e| write(&dest, format!("close parquet writer: {e}")))?;
        file.sync_all()
            .map_err(|e| write(&dest, format!("sync: {e}")))?;
        drop(file);
        staged.commit(&dest)?;
        Ok(rows)
    }
}

impl std::fmt::Debug for ParquetWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetWriter")
            .field("dest", &self.dest)
            .field("rows", &self.rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripclean_core::schema::Field;
    use tripclean_core::types::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, true),
            Field::new("at", DataType::Timestamp, true),
            Field::new("lat", DataType::Float64, true),
        ])
    }

    fn batch() -> RowBatch {
        RowBatch::new(vec![
            Column::new("id", vec![Scalar::Str("a".into()), Scalar::Str("b".into())]),
            Column::new("at", vec![Scalar::Timestamp(0), Scalar::Null]),
            Column::new("lat", vec![Scalar::F64(41.9), Scalar::Null]),
        ])
    }

    #[test]
    fn writes_and_publishes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.parquet");
        let mut w = ParquetWriter::create(&dest, &schema()).unwrap();
        w.write_batch(&batch()).unwrap();
        assert!(!dest.exists(), "nothing visible before finish");
        assert_eq!(w.finish().unwrap(), 2);
        assert!(dest.exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn dropped_writer_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.parquet");
        {
            let mut w = ParquetWriter::create(&dest, &schema()).unwrap();
            w.write_batch(&batch()).unwrap();
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_parent_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/out.parquet");
        let err = ParquetWriter::create(&dest, &schema()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Write(_)));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let bad = RowBatch::new(vec![
            Column::new("id", vec![Scalar::I64(1)]),
            Column::new("at", vec![Scalar::Null]),
            Column::new("lat", vec![Scalar::Null]),
        ]);
        let s = schema();
        let err = to_record_batch(&bad, &s, to_arrow_schema(&s)).unwrap_err();
        assert!(err.contains("expected VARCHAR"));
    }
}
