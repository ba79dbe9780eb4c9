#![forbid(unsafe_code)]
//! tripclean-core: shared types for the trip cleaning pipeline.
//!
//! - `types`/`schema`: lightweight row batches and logical schemas (no Arrow here).
//! - `expr`: the expression AST used by typing, enrichment, and filtering.
//! - `dag`: logical/physical plan nodes produced by the planner.
//! - `config`, `error`, `hash`, `manifest`: the ambient pieces every crate shares.

pub mod config;
pub mod dag;
pub mod error;
pub mod expr;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod temporal;
pub mod types;

/// Version string stamped into run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
