#![forbid(unsafe_code)]
//! tripclean: clean a directory of monthly bike-share trip-history CSVs into
//! one verified parquet file.
//!
//! ```no_run
//! use tripclean::CleanConfig;
//!
//! let cfg = CleanConfig {
//!     raw_dir: "/data/raw".into(),
//!     clean_dir: "/data/clean".into(),
//!     ..CleanConfig::default()
//! };
//! let report = tripclean::run(cfg)?;
//! println!("{} rows -> {}", report.verified_rows, report.output.display());
//! # Ok::<(), tripclean::Error>(())
//! ```

pub use tripclean_core as core;
pub use tripclean_exec as exec;
pub use tripclean_io as io;
pub use tripclean_operators as operators;
pub use tripclean_planner as planner;

pub use tripclean_core::config::{CleanConfig, DurationBounds};
pub use tripclean_core::error::{Error, Result};
pub use tripclean_exec::{Engine, PreparedRun, RunReport};
pub use tripclean_planner::{Relation, TripCleaningPolicy};

/// Run the whole pipeline once. The clean directory must already exist.
pub fn run(cfg: CleanConfig) -> Result<RunReport> {
    let mut engine = Engine::new(cfg).map_err(|e| e.into_core())?;
    engine.execute().map_err(|e| e.into_core())
}
