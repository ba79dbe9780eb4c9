//! Convenient re-exports for downstream crates.

pub use crate::config::{CleanConfig, DurationBounds};
pub use crate::dag::{LogicalPlan, NamedExpr, PhysicalPlan, ScanSpec};
pub use crate::error::{Error, Result};
pub use crate::expr::{CmpOp, Expr};
pub use crate::id::OpId;
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Column, RowBatch, Scalar};
