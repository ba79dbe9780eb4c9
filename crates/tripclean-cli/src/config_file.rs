//! Optional YAML config file layered between environment and flags.
//!
//! ```yaml
//! raw_dir: ~/divvy/raw
//! clean_dir: ~/divvy/clean
//! pattern: "2024-*.csv"
//! infer_all: true
//! duration:
//!   min_minutes: 1
//!   max_minutes: 720
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tripclean_core::config::{CleanConfig, DurationBounds};

/// Every key is optional; absent keys leave the current value alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub raw_dir: Option<String>,
    pub clean_dir: Option<String>,
    pub pattern: Option<String>,
    pub out: Option<String>,
    pub infer_all: Option<bool>,
    pub sample_rows: Option<usize>,
    pub batch_rows: Option<usize>,
    pub duration: Option<DurationBounds>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text =
            fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
        Self::parse(&text).map_err(|e| format!("{}: {e}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn apply(&self, cfg: &mut CleanConfig) {
        if let Some(v) = &self.raw_dir {
            cfg.raw_dir = v.clone();
        }
        if let Some(v) = &self.clean_dir {
            cfg.clean_dir = v.clone();
        }
        if let Some(v) = &self.pattern {
            cfg.pattern = v.clone();
        }
        if let Some(v) = &self.out {
            cfg.out = v.clone();
        }
        if let Some(v) = self.infer_all {
            cfg.infer_all = v;
        }
        if let Some(v) = self.sample_rows {
            cfg.sample_rows = v;
        }
        if let Some(v) = self.batch_rows {
            cfg.batch_rows = v;
        }
        if let Some(v) = self.duration {
            cfg.duration = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_overrides_only_present_keys() {
        let file = ConfigFile::parse("raw_dir: /srv/raw\ninfer_all: true\n").unwrap();
        let mut cfg = CleanConfig::default();
        file.apply(&mut cfg);
        assert_eq!(cfg.raw_dir, "/srv/raw");
        assert!(cfg.infer_all);
        assert_eq!(cfg.clean_dir, "data/clean");
        assert_eq!(cfg.batch_rows, 8_192);
    }

    #[test]
    fn duration_window_is_configurable() {
        let file =
            ConfigFile::parse("duration:\n  min_minutes: 2\n  max_minutes: 60\n").unwrap();
        let mut cfg = CleanConfig::default();
        file.apply(&mut cfg);
        assert_eq!(cfg.duration.min_minutes, 2);
        assert_eq!(cfg.duration.max_minutes, 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("spill_dir: /tmp\n").is_err());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("missing.yaml");
        let err = ConfigFile::load(&p).unwrap_err();
        assert!(err.contains("missing.yaml"));
    }
}
