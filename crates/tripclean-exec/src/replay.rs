//! Deterministic provenance digests for run manifests.
//!
//! Identical inputs and plan produce identical digests, so two manifests can
//! be compared to tell whether a rerun saw the same world.

use std::path::Path;

use tripclean_core::error::Error;
use tripclean_core::hash::{hash_bytes, hash_file, hash_serde, Hash256};
use tripclean_planner::physical::PhysicalProgram;

use crate::ExecError;

/// Hash of the serialized physical program (plan tree and bindings).
pub fn hash_program(program: &PhysicalProgram) -> Result<Hash256, ExecError> {
    Ok(hash_serde(program)?)
}

/// Digest over each input's path and byte length, in the given order.
pub fn hash_inputs(files: &[String]) -> Result<Hash256, ExecError> {
    let mut buf = Vec::new();
    for f in files {
        let len = std::fs::metadata(f)
            .map_err(|e| Error::Ingestion(format!("{f}: stat: {e}")))?
            .len();
        buf.extend_from_slice(f.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&len.to_le_bytes());
    }
    Ok(hash_bytes(&buf))
}

/// Content digest of the written output.
pub fn hash_output(path: &Path) -> Result<Hash256, ExecError> {
    hash_file(path)
        .map_err(|e| Error::Write(format!("{}: digest: {e}", path.display())).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn input_digest_tracks_size() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.csv");
        std::fs::write(&p, "x\n1\n").unwrap();
        let files = vec![p.to_string_lossy().into_owned()];
        let a = hash_inputs(&files).unwrap();
        assert_eq!(a, hash_inputs(&files).unwrap());

        let mut f = std::fs::OpenOptions::new().append(true).open(&p).unwrap();
        writeln!(f, "2").unwrap();
        assert_ne!(a, hash_inputs(&files).unwrap());
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(hash_inputs(&["/definitely/not/here.csv".to_string()]).is_err());
    }
}
