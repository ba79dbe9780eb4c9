#![forbid(unsafe_code)]
//! tripclean-operators: block-at-a-time operators over `RowBatch`.
//!
//! Design intent:
//! - Pure and synchronous; no IO.
//! - Operators are plain serde structs so the exec runtime can instantiate them
//!   from the JSON config carried by physical-plan bindings.
//! - `plan(...)` validates against input schemas up front; `eval_block(...)` is
//!   deterministic given the same input block.

pub mod eval;
pub mod filter;
pub mod map;
pub mod plan;
pub mod traits;

pub use filter::Filter;
pub use map::Map;
pub use plan::OpPlan;
pub use traits::{OpError, Operator};
