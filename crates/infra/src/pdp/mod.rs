//! Policy decision point implementations.
//!
//! The gate only sees `dyn DecisionClient`; everything here is swappable.

pub mod in_memory;
pub mod policy;

pub use in_memory::InMemoryDecisionPoint;
pub use policy::{Grant, PolicyLoadError, PolicySet, Subject};
