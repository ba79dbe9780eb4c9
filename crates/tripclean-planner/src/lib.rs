#![forbid(unsafe_code)]
//! tripclean-planner: from a probed CSV scan to a physical program.
//!
//! - `policy`: which columns get coerced, and the row-validity predicate.
//! - `relation`: immutable builder (`scan → typed → enriched → clean`); each
//!   step wraps the previous `LogicalPlan` and type-checks the new node.
//! - `lower`: assigns `OpId`s and operator keys; exec instantiates operators
//!   from the JSON config carried by each binding.
//!
//! No IO and no Arrow here.

pub mod lower;
pub mod physical;
pub mod policy;
pub mod relation;

pub use lower::lower_to_physical;
pub use physical::{OperatorBinding, PhysicalProgram};
pub use policy::TripCleaningPolicy;
pub use relation::Relation;
