//! Deterministic run manifest for audit/replay.
//!
//! The engine returns a manifest after a successful run. Identical inputs and
//! plan produce identical `plan_hash`, `inputs_digest`, and row counts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the physical program (plan + operator bindings).
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Digest over input paths and sizes.
    pub inputs_digest: Option<Hash256>,

    /// Digest of the written output file.
    pub outputs_digest: Option<Hash256>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            inputs_digest: None,
            outputs_digest: None,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn with_inputs(mut self, digest: Hash256) -> Self {
        self.inputs_digest = Some(digest);
        self
    }

    pub fn finish(mut self, finished_ms: u64, outputs_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.outputs_digest = outputs_digest;
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
