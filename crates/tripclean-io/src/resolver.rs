//! Input discovery: expand `root/pattern` into a sorted list of absolute paths.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Resolve the files matching `pattern` inside `root`.
///
/// The result is sorted by the bytes of the full path string and contains
/// only regular files. Wildcards never match a leading dot, so hidden files
/// such as editor backups or `._` resource forks are skipped. No file is
/// opened.
pub fn resolve_inputs(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::MissingDirectory(root.to_path_buf()));
    }
    let root = fs::canonicalize(root).map_err(|_| Error::MissingDirectory(root.to_path_buf()))?;

    let root_str = root.to_string_lossy();
    let shown = root.join(pattern).to_string_lossy().into_owned();
    let full = format!(
        "{}{}{}",
        Pattern::escape(&root_str),
        std::path::MAIN_SEPARATOR,
        pattern
    );

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let entries = glob::glob_with(&full, options).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(path) => debug!(path = %path.display(), "skipping non-file match"),
            Err(e) => warn!(error = %e, "unreadable path while globbing"),
        }
    }
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    if files.is_empty() {
        return Err(Error::NoMatchingFiles(shown));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn returns_sorted_absolute_matches() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2024-02.csv", "2024-01.csv", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = resolve_inputs(dir.path(), "*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2024-01.csv", "2024-02.csv"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn missing_root_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_inputs(&dir.path().join("absent"), "*.csv").unwrap_err();
        assert!(matches!(err, Error::MissingDirectory(_)));
    }

    #[test]
    fn empty_match_set_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_inputs(dir.path(), "*.csv").unwrap_err();
        match err {
            Error::NoMatchingFiles(p) => assert!(p.ends_with("*.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_inputs(dir.path(), "[*.csv").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn wildcards_skip_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.csv", ".hidden.csv", "._a.csv"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let files = resolve_inputs(dir.path(), "*.csv").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.csv"));
    }

    #[test]
    fn order_follows_full_path_string() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["a", "a-b"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            File::create(dir.path().join(sub).join("x.csv")).unwrap();
        }
        let files = resolve_inputs(dir.path(), "*/x.csv").unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| {
                let parent = p.parent().unwrap().file_name().unwrap();
                parent.to_string_lossy().into_owned()
            })
            .collect();
        // '-' sorts before '/', so "a-b/x.csv" precedes "a/x.csv".
        assert_eq!(rel, vec!["a-b", "a"]);
    }
}
