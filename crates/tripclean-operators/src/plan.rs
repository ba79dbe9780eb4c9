//! Operator planning surface.

use serde::{Deserialize, Serialize};
use tripclean_core::prelude::Schema;

/// Operator plan: output schema plus whether row count is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpPlan {
    pub output_schema: Schema,

    /// `true` when every input row yields exactly one output row.
    pub preserves_rows: bool,
}

impl OpPlan {
    pub fn new(output_schema: Schema) -> Self {
        Self {
            output_schema,
            preserves_rows: true,
        }
    }

    pub fn filtering(mut self) -> Self {
        self.preserves_rows = false;
        self
    }
}
