//! Physical program: `PhysicalPlan` plus operator bindings.
//!
//! The exec runtime turns each binding into a concrete operator (or the scan
//! source / parquet sink it drives itself).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tripclean_core::dag::PhysicalPlan;
use tripclean_core::id::OpId;

/// Operator key ("source", "map", "filter", "sink") and its JSON config. For
/// `map` and `filter` the config is the serde form of the operator struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorBinding {
    pub key: String,
    pub config: serde_json::Value,
}

/// Physical tree + a stable map of OpIds → bindings. `BTreeMap` keeps the
/// serialized form deterministic for plan hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalProgram {
    pub plan: PhysicalPlan,
    pub bindings: BTreeMap<OpId, OperatorBinding>,
}

impl PhysicalProgram {
    pub fn new(plan: PhysicalPlan, bindings: BTreeMap<OpId, OperatorBinding>) -> Self {
        Self { plan, bindings }
    }

    /// Bindings from source to sink.
    pub fn stages(&self) -> Vec<(OpId, &OperatorBinding)> {
        self.plan
            .pipeline_order()
            .into_iter()
            .filter_map(|id| self.bindings.get(&id).map(|b| (id, b)))
            .collect()
    }
}
