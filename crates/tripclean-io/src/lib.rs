#![forbid(unsafe_code)]
//! tripclean-io: everything that touches the filesystem.
//!
//! - `resolver`: glob discovery of the input CSV set.
//! - `readers::csv`: header probe, type inference, and block-wise streaming.
//! - `writers::parquet`: Arrow conversion and atomic (temp + rename) Parquet output.
//! - `readers::parquet`: independent read-back used to verify a written file.

pub mod error;
pub mod readers;
pub mod resolver;
pub mod writers;

pub use readers::csv::{probe, CsvBatchReader, CsvOptions};
pub use resolver::resolve_inputs;
pub use writers::parquet::ParquetWriter;
