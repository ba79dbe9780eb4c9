#![forbid(unsafe_code)]
//! tripclean-exec: the run session.
//!
//! `Engine::prepare` resolves inputs, probes them, and builds the cleaning
//! plan; `Engine::run` streams every file through the operator chain into an
//! atomically written parquet file and verifies it by reading it back.

pub mod metrics;
pub mod replay;
pub mod runtime;

pub use runtime::{Engine, ExecError, PreparedRun, RunReport};
