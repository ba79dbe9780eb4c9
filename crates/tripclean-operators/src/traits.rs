//! Operator trait + common interfaces.
//!
//! The exec runtime calls `plan(...)` once to validate schemas and obtain the
//! output schema, then `eval_block(...)` for every block in stream order.

use tripclean_core::error::Error as CoreError;
use tripclean_core::prelude::Schema;
use tripclean_core::types::RowBatch;

use crate::plan::OpPlan;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<CoreError> for OpError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Schema(msg) => OpError::Schema(msg),
            other => OpError::Plan(other.to_string()),
        }
    }
}

impl From<OpError> for CoreError {
    fn from(e: OpError) -> Self {
        match e {
            OpError::Schema(msg) => CoreError::Schema(msg),
            OpError::Plan(msg) => CoreError::Plan(msg),
            OpError::Exec(msg) => CoreError::Plan(format!("operator failed: {msg}")),
        }
    }
}

/// Trait that all operators must implement.
///
/// Invariants:
/// - `eval_block` never mutates its input; it returns a new batch.
/// - `eval_block` must be deterministic given the same inputs.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Given input schemas, return the output schema. Unknown columns and
    /// ill-typed expressions are rejected here, before any data flows.
    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan, OpError>;

    /// Evaluate one block.
    fn eval_block(&self, inputs: &[RowBatch]) -> Result<RowBatch, OpError>;
}

pub(crate) fn single_input<'a, T>(items: &'a [T], op: &str) -> Result<&'a T, OpError> {
    match items {
        [one] => Ok(one),
        _ => Err(OpError::Plan(format!(
            "{op} expects exactly one input, got {}",
            items.len()
        ))),
    }
}
