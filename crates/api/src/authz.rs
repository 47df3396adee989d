//! API-side glue around the authorization gate.
//!
//! Handlers first take the resolved principal with [`require_principal`],
//! then call [`protect`] with their fixed action and resource. Refusals come
//! back as ready-made responses and every outcome is counted.

use std::future::Future;

use accessgate_auth::{Action, DecisionContext, GateError, GateOutcome, Principal, ResourceRef};

use crate::app::{AppState, errors};
use crate::context::PrincipalContext;

/// The request's principal, or a counted 401.
///
/// Runs before any input parsing so an anonymous caller always sees 401,
/// whatever else is wrong with the request.
pub fn require_principal(
    state: &AppState,
    principal: Option<PrincipalContext>,
) -> Result<PrincipalContext, axum::response::Response> {
    principal.ok_or_else(|| {
        tracing::info!(
            outcome = GateOutcome::Unauthenticated.as_str(),
            "authorization refused: no principal"
        );
        state.outcomes.record(GateOutcome::Unauthenticated.as_str());
        errors::gate_error_to_response(&GateError::Unauthenticated)
    })
}

/// Run `op` behind the gate.
///
/// This is intended to be called **before** any side effect of the handler.
pub async fn protect<T, F, Fut>(
    state: &AppState,
    principal: &PrincipalContext,
    action: &Action,
    resource: &ResourceRef,
    context: DecisionContext,
    op: F,
) -> Result<T, axum::response::Response>
where
    F: FnOnce(&Principal) -> Fut,
    Fut: Future<Output = T>,
{
    let result = state
        .gate
        .protect(Some(principal.principal()), action, resource, context, op)
        .await;

    match result {
        Ok(value) => {
            state.outcomes.record(GateOutcome::Allowed.as_str());
            Ok(value)
        }
        Err(e) => {
            state.outcomes.record(e.outcome().as_str());
            Err(errors::gate_error_to_response(&e))
        }
    }
}
