//! Run configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive trip-duration window, in whole minutes, for a row to count as valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBounds {
    pub min_minutes: i64,
    pub max_minutes: i64,
}

impl DurationBounds {
    /// One minute to 24 hours: bicycle-trip granularity.
    pub const TRIP: DurationBounds = DurationBounds {
        min_minutes: 1,
        max_minutes: 1440,
    };

    pub fn contains(&self, minutes: i64) -> bool {
        (self.min_minutes..=self.max_minutes).contains(&minutes)
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self::TRIP
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Directory containing the monthly CSV files.
    pub raw_dir: String,

    /// Directory the cleaned output is written into. Must exist before `run()`.
    pub clean_dir: String,

    /// Glob pattern matched inside `raw_dir`.
    pub pattern: String,

    /// Output file name placed under `clean_dir`.
    pub out: String,

    /// Scan every row for type inference instead of a bounded sample.
    pub infer_all: bool,

    /// Rows per file inspected by the fast inference mode.
    pub sample_rows: usize,

    /// Rows per block streamed through the operators.
    pub batch_rows: usize,

    /// Validity window for `duration_min`.
    pub duration: DurationBounds,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            raw_dir: "data/raw".to_string(),
            clean_dir: "data/clean".to_string(),
            pattern: "*.csv".to_string(),
            out: "trips_clean.parquet".to_string(),
            infer_all: false,
            sample_rows: 20_480,
            batch_rows: 8_192,
            duration: DurationBounds::TRIP,
        }
    }
}

impl CleanConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RAW_DIR`: input directory
    /// - `CLEAN_DIR`: output directory
    /// - `TRIPCLEAN_PATTERN`: glob pattern
    /// - `TRIPCLEAN_OUT`: output file name
    /// - `TRIPCLEAN_INFER_ALL`: `1`/`true` for exhaustive inference
    /// - `TRIPCLEAN_SAMPLE_ROWS`: inference sample size per file
    /// - `TRIPCLEAN_BATCH_ROWS`: rows per execution block
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("RAW_DIR") {
            cfg.raw_dir = s;
        }

        if let Some(s) = lookup("CLEAN_DIR") {
            cfg.clean_dir = s;
        }

        if let Some(s) = lookup("TRIPCLEAN_PATTERN") {
            cfg.pattern = s;
        }

        if let Some(s) = lookup("TRIPCLEAN_OUT") {
            cfg.out = s;
        }

        if let Some(s) = lookup("TRIPCLEAN_INFER_ALL") {
            cfg.infer_all = matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(s) = lookup("TRIPCLEAN_SAMPLE_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sample_rows = v;
            }
        }

        if let Some(s) = lookup("TRIPCLEAN_BATCH_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.batch_rows = v;
            }
        }

        cfg
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_rows == 0 {
            return Err(Error::Config("batch_rows must be at least 1".into()));
        }
        if self.sample_rows == 0 && !self.infer_all {
            return Err(Error::Config(
                "sample_rows must be at least 1 unless infer_all is set".into(),
            ));
        }
        if self.pattern.trim().is_empty() {
            return Err(Error::Config("pattern must not be empty".into()));
        }
        if self.out.trim().is_empty() {
            return Err(Error::Config("out must not be empty".into()));
        }
        if self.duration.min_minutes > self.duration.max_minutes {
            return Err(Error::Config(format!(
                "duration bounds are inverted: {} > {}",
                self.duration.min_minutes, self.duration.max_minutes
            )));
        }
        Ok(())
    }

    /// `<clean_dir>/<out>` as given (not canonicalized).
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.clean_dir).join(&self.out)
    }

    /// Inference sample size, or `None` for an exhaustive scan.
    pub fn inference_limit(&self) -> Option<usize> {
        if self.infer_all {
            None
        } else {
            Some(self.sample_rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_cli_contract() {
        let cfg = CleanConfig::default();
        assert_eq!(cfg.raw_dir, "data/raw");
        assert_eq!(cfg.clean_dir, "data/clean");
        assert_eq!(cfg.pattern, "*.csv");
        assert_eq!(cfg.out, "trips_clean.parquet");
        assert!(!cfg.infer_all);
        assert_eq!(cfg.duration, DurationBounds { min_minutes: 1, max_minutes: 1440 });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("RAW_DIR", "/in"),
            ("CLEAN_DIR", "/out"),
            ("TRIPCLEAN_INFER_ALL", "true"),
            ("TRIPCLEAN_BATCH_ROWS", "128"),
            ("TRIPCLEAN_SAMPLE_ROWS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let cfg = CleanConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.raw_dir, "/in");
        assert_eq!(cfg.clean_dir, "/out");
        assert!(cfg.infer_all);
        assert_eq!(cfg.batch_rows, 128);
        assert_eq!(cfg.sample_rows, 20_480);
        assert_eq!(cfg.inference_limit(), None);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = CleanConfig::default();
        cfg.batch_rows = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let mut cfg = CleanConfig::default();
        cfg.duration = DurationBounds { min_minutes: 10, max_minutes: 5 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bounds_are_inclusive() {
        let b = DurationBounds::TRIP;
        assert!(!b.contains(0));
        assert!(b.contains(1));
        assert!(b.contains(1440));
        assert!(!b.contains(1441));
    }
}
