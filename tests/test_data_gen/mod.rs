//! Shared fixtures: raw/clean directory pairs and trip CSV writers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tripclean::CleanConfig;

pub const HEADER: &str = "ride_id,rideable_type,started_at,ended_at,start_station_name,\
start_station_id,end_station_name,end_station_id,start_lat,start_lng,end_lat,end_lng,member_casual";

pub struct Workspace {
    _root: TempDir,
    pub raw: PathBuf,
    pub clean: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let raw = root.path().join("raw");
        let clean = root.path().join("clean");
        fs::create_dir_all(&raw).expect("raw dir");
        fs::create_dir_all(&clean).expect("clean dir");
        Self {
            _root: root,
            raw,
            clean,
        }
    }

    pub fn config(&self) -> CleanConfig {
        CleanConfig {
            raw_dir: self.raw.to_string_lossy().into_owned(),
            clean_dir: self.clean.to_string_lossy().into_owned(),
            ..CleanConfig::default()
        }
    }

    pub fn output(&self) -> PathBuf {
        self.clean.join("trips_clean.parquet")
    }

    /// Write `name` with the standard header followed by `rows`.
    pub fn write_trips(&self, name: &str, rows: &[String]) -> PathBuf {
        write_csv(&self.raw.join(name), HEADER, rows)
    }
}

pub fn write_csv(path: &Path, header: &str, rows: &[String]) -> PathBuf {
    let mut body = String::from(header);
    body.push('\n');
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    fs::write(path, body).expect("write csv");
    path.to_path_buf()
}

/// A full trip row with sensible defaults around the fields tests vary.
pub fn trip(ride_id: &str, started_at: &str, ended_at: &str, member: &str) -> String {
    trip_at(ride_id, started_at, ended_at, "41.8810", member)
}

pub fn trip_at(ride_id: &str, started_at: &str, ended_at: &str, start_lat: &str, member: &str) -> String {
    format!(
        "{ride_id},classic_bike,{started_at},{ended_at},Clark St & Elm St,TA1307000039,\
Wells St & Concord Ln,TA1308000050,{start_lat},-87.6298,41.9120,-87.6348,{member}"
    )
}
