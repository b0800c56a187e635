//! Access-control core: inheritable folder metadata and the per-principal
//! access decision.
//!
//! Both halves are pure functions with no shared mutable state, safe for
//! unlimited concurrent invocation across requests.

pub mod evaluator;
pub mod metadata;

pub use evaluator::{AccessEvaluator, Principal};
pub use metadata::{resolve_metadata, AccessMetadata};
