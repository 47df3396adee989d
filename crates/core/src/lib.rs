//! Identifiers and value types shared by the gate and the API.
//!
//! This crate contains **pure domain** primitives (no IO, no transport).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, TenantId};
pub use value_object::{Amount, ValueObject};
