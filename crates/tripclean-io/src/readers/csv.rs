//! Multi-file CSV ingestion.
//!
//! `probe` reads every header plus an inference sample and returns a lazy
//! `ScanSpec`; no data rows are materialized. `CsvBatchReader` streams one file
//! in blocks of `RowBatch`es decoded with the probed types and tagged with the
//! provenance column.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use tripclean_core::dag::ScanSpec;
use tripclean_core::schema::{DataType, Field, Schema};
use tripclean_core::temporal::parse_timestamp_micros;
use tripclean_core::types::{Column, RowBatch, Scalar};

use crate::error::{ingestion, Result};

/// Default read-ahead per open CSV file.
pub const DEFAULT_READ_BUFFER: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Data rows per file inspected for type inference; `None` scans every row.
    pub sample_rows: Option<usize>,
    /// Columns whose type is fixed by the caller instead of inferred.
    pub type_overrides: BTreeMap<String, DataType>,
    /// Name of the synthetic provenance column.
    pub filename_column: String,
    pub read_buffer: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sample_rows: Some(20_480),
            type_overrides: BTreeMap::new(),
            filename_column: "filename".to_string(),
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }
}

impl CsvOptions {
    fn reader(&self, path: &Path) -> Result<csv::Reader<File>> {
        let file = File::open(path)
            .map_err(|e| ingestion(path, format!("open: {e}")))?;
        Ok(ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .buffer_capacity(self.read_buffer.max(1))
            .from_reader(file))
    }
}

/// Evidence gathered for one column: which types every non-empty value fits.
#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    seen: usize,
    all_bool: bool,
    all_int: bool,
    all_float: bool,
    all_timestamp: bool,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            seen: 0,
            all_bool: true,
            all_int: true,
            all_float: true,
            all_timestamp: true,
        }
    }
}

impl ColumnStats {
    fn observe(&mut self, raw: &str) {
        let v = raw.trim();
        if v.is_empty() {
            return;
        }
        self.seen += 1;
        if self.all_bool {
            self.all_bool = parse_bool(v).is_some();
        }
        if self.all_int {
            self.all_int = v.parse::<i64>().is_ok();
        }
        if self.all_float {
            self.all_float = v.parse::<f64>().is_ok();
        }
        if self.all_timestamp {
            self.all_timestamp = parse_timestamp_micros(v).is_some();
        }
    }

    /// Narrowest type consistent with every observed value; `None` without evidence.
    fn resolve(&self) -> Option<DataType> {
        if self.seen == 0 {
            None
        } else if self.all_bool {
            Some(DataType::Boolean)
        } else if self.all_int {
            Some(DataType::Int64)
        } else if self.all_float {
            Some(DataType::Float64)
        } else if self.all_timestamp {
            Some(DataType::Timestamp)
        } else {
            Some(DataType::Utf8)
        }
    }
}

/// Merge the types two files inferred for the same column.
fn unify(a: Option<DataType>, b: Option<DataType>) -> Option<DataType> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(x), Some(y)) if x == y => Some(x),
        (Some(DataType::Int64), Some(DataType::Float64))
        | (Some(DataType::Float64), Some(DataType::Int64)) => Some(DataType::Float64),
        _ => Some(DataType::Utf8),
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn read_header(
    path: &Path,
    options: &CsvOptions,
) -> Result<(csv::Reader<File>, Vec<String>)> {
    let mut rdr = options.reader(path)?;
    let header = rdr
        .headers()
        .map_err(|e| ingestion(path, format!("header: {e}")))?
        .clone();
    let names: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(ingestion(path, "missing header row"));
    }
    let mut seen = HashSet::new();
    for n in &names {
        if n.is_empty() {
            return Err(ingestion(path, "header contains an empty column name"));
        }
        if !seen.insert(n.as_str()) {
            return Err(ingestion(path, format!("duplicate column '{n}' in header")));
        }
        if *n == options.filename_column {
            return Err(ingestion(
                path,
                format!("header already has a '{n}' column; it is reserved for provenance"),
            ));
        }
    }
    Ok((rdr, names))
}

/// Probe headers and infer column types across `files`.
///
/// Every file must carry the same header (names and order). Only the header
/// and the inference sample are read; the returned spec is lazy.
pub fn probe(files: &[PathBuf], options: &CsvOptions) -> Result<ScanSpec> {
    let first = files
        .first()
        .ok_or_else(|| tripclean_core::error::Error::Ingestion("no input files".into()))?;

    let mut header: Option<Vec<String>> = None;
    let mut types: Vec<Option<DataType>> = Vec::new();

    for path in files {
        let (mut rdr, names) = read_header(path, options)?;
        match &header {
            None => {
                types = vec![None; names.len()];
                header = Some(names);
            }
            Some(expected) if *expected != names => {
                return Err(ingestion(
                    path,
                    format!(
                        "header [{}] differs from {} header [{}]",
                        names.join(","),
                        first.display(),
                        expected.join(",")
                    ),
                ));
            }
            Some(_) => {}
        }

        let mut stats = vec![ColumnStats::default(); types.len()];
        let mut record = StringRecord::new();
        let mut rows = 0usize;
        while options.sample_rows.map_or(true, |limit| rows < limit) {
            let more = rdr
                .read_record(&mut record)
                .map_err(|e| ingestion(path, e))?;
            if !more {
                break;
            }
            for (stat, value) in stats.iter_mut().zip(record.iter()) {
                stat.observe(value);
            }
            rows += 1;
        }
        debug!(path = %path.display(), rows, "sampled for type inference");

        for (slot, stat) in types.iter_mut().zip(&stats) {
            *slot = unify(*slot, stat.resolve());
        }
    }

    let names = header.unwrap_or_default();
    let mut fields: Vec<Field> = names
        .iter()
        .zip(&types)
        .map(|(name, inferred)| {
            let dt = options
                .type_overrides
                .get(name)
                .copied()
                .or(*inferred)
                .unwrap_or(DataType::Utf8);
            Field::new(name.clone(), dt, true)
        })
        .collect();
    fields.push(Field::new(options.filename_column.clone(), DataType::Utf8, false));

    info!(
        files = files.len(),
        columns = names.len(),
        exhaustive = options.sample_rows.is_none(),
        "probed CSV inputs"
    );

    Ok(ScanSpec {
        files: files.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        schema: Schema::new(fields),
        filename_column: options.filename_column.clone(),
    })
}

/// Streams one CSV file of a `ScanSpec` as `RowBatch` blocks.
pub struct CsvBatchReader {
    path: PathBuf,
    filename: String,
    reader: csv::Reader<File>,
    fields: Vec<Field>,
    filename_column: String,
    record: StringRecord,
    rows_read: u64,
}

impl CsvBatchReader {
    /// Open `path` and check its header against the probed spec.
    pub fn open(path: &Path, spec: &ScanSpec, options: &CsvOptions) -> Result<Self> {
        let (reader, names) = read_header(path, options)?;
        let fields = spec.csv_fields().to_vec();
        let expected: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        if names.iter().map(String::as_str).ne(expected.iter().copied()) {
            return Err(ingestion(path, "header changed since the scan was planned"));
        }
        Ok(Self {
            path: path.to_path_buf(),
            filename: path.to_string_lossy().into_owned(),
            reader,
            fields,
            filename_column: spec.filename_column.clone(),
            record: StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Read up to `max_rows` rows; `None` once the file is exhausted.
    pub fn next_batch(&mut self, max_rows: usize) -> Result<Option<RowBatch>> {
        let mut values: Vec<Vec<Scalar>> = self
            .fields
            .iter()
            .map(|_| Vec::with_capacity(max_rows))
            .collect();
        let mut n = 0usize;

        while n < max_rows {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| ingestion(&self.path, e))?;
            if !more {
                break;
            }
            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            let cells = self.fields.iter().zip(values.iter_mut()).zip(self.record.iter());
            for ((field, out), raw) in cells {
                let v = decode(raw, field.data_type).ok_or_else(|| {
                    ingestion(
                        &self.path,
                        format!(
                            "line {line}: value '{raw}' in column '{}' is not a valid {}; \
                             the inference sample missed it, rerun with --infer-all",
                            field.name, field.data_type
                        ),
                    )
                })?;
                out.push(v);
            }
            n += 1;
        }

        if n == 0 {
            return Ok(None);
        }
        self.rows_read += n as u64;

        let mut columns: Vec<Column> = self
            .fields
            .iter()
            .zip(values)
            .map(|(f, vals)| Column::new(f.name.clone(), vals))
            .collect();
        columns.push(Column::new(
            self.filename_column.clone(),
            vec![Scalar::Str(self.filename.clone()); n],
        ));
        Ok(Some(RowBatch::new(columns)))
    }
}

/// Decode one field; empty fields are `Null`. `None` means the value does not fit `dt`.
/// Empty fields are null for every type; whitespace-only fields are null
/// only for the parsed types and stay as text for `Utf8`.
fn decode(raw: &str, dt: DataType) -> Option<Scalar> {
    if raw.is_empty() {
        return Some(Scalar::Null);
    }
    if dt == DataType::Utf8 {
        return Some(Scalar::Str(raw.to_string()));
    }
    let v = raw.trim();
    if v.is_empty() {
        return Some(Scalar::Null);
    }
    match dt {
        DataType::Utf8 => Some(Scalar::Str(raw.to_string())),
        DataType::Boolean => parse_bool(v).map(Scalar::Bool),
        DataType::Int64 => v.parse::<i64>().ok().map(Scalar::I64),
        DataType::Float64 => v.parse::<f64>().ok().map(Scalar::F64),
        DataType::Timestamp => parse_timestamp_micros(v).map(Scalar::Timestamp),
    }
}
