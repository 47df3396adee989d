//! Authorization gate between a request pipeline and a policy decision point.
//!
//! This crate is intentionally decoupled from HTTP and from any concrete PDP:
//! callers resolve the principal themselves and inject a [`DecisionClient`].

pub mod action;
pub mod claims;
pub mod client;
pub mod context;
pub mod decision;
pub mod gate;
pub mod principal;
pub mod query;
pub mod resource;
pub mod roles;
pub mod sync;

pub use action::{Action, ActionError};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use client::{DecisionClient, DecisionError};
pub use context::{ContextError, DecisionContext};
pub use decision::{Decision, IndeterminatePolicy};
pub use gate::{AuthorizationGate, GateConfig, GateError, GateMode, GateOutcome};
pub use principal::{Principal, PrincipalId, PrincipalIdError};
pub use query::DecisionQuery;
pub use resource::{ResourceRef, ResourceRefError};
pub use roles::Role;
pub use sync::{SyncError, SyncFailureMode, await_ready, resolve_startup};
