//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the in-memory account book behind the protected routes
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses (including the denial responder)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use accessgate_auth::{
    AuthorizationGate, GateConfig, GateOutcome, Principal, PrincipalId, Role, resolve_startup,
};
use accessgate_infra::pdp::{InMemoryDecisionPoint, PolicySet};
use accessgate_observability::OutcomeCounters;

use crate::config::ApiConfig;
use crate::middleware::{self, JwtPrincipalResolver, PrincipalResolver, StaticPrincipalResolver};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Shared, read-only (or internally synchronized) request-time dependencies.
#[derive(Debug)]
pub struct AppState {
    pub gate: AuthorizationGate,
    pub accounts: services::AccountBook,
    pub outcomes: OutcomeCounters,
}

impl AppState {
    pub fn new(gate: AuthorizationGate) -> Self {
        Self {
            gate,
            accounts: services::AccountBook::new(),
            outcomes: OutcomeCounters::new(GateOutcome::ALL.map(GateOutcome::as_str)),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: Arc<AppState>, resolver: Arc<dyn PrincipalResolver>) -> Router {
    let auth_state = middleware::AuthState { resolver };

    // Principal resolution never rejects; the gate decides per route.
    let resolved = routes::router()
        .layer(Extension(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::principal_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/ready", get(routes::system::ready))
        .route("/metrics", get(routes::system::metrics))
        .layer(Extension(state))
        .merge(resolved)
        .layer(ServiceBuilder::new())
}

/// Wire the decision point, run the startup barrier, and build the router.
///
/// Fails if the barrier times out and the configured failure mode is `abort`.
pub async fn bootstrap(config: &ApiConfig) -> anyhow::Result<Router> {
    let pdp = Arc::new(InMemoryDecisionPoint::pending());
    spawn_policy_sync(pdp.clone(), config.policy_file.clone());

    let mode = resolve_startup(&*pdp, config.sync_timeout, config.sync_failure)
        .await
        .context("decision point did not become ready")?;

    let mut gate_config = GateConfig::default()
        .with_indeterminate(config.indeterminate)
        .with_mode(mode);
    if let Some(timeout) = config.decision_timeout {
        gate_config = gate_config.with_decision_timeout(timeout);
    }

    let gate = AuthorizationGate::with_config(pdp, gate_config);
    let state = Arc::new(AppState::new(gate));

    Ok(build_app(state, principal_resolver(config)?))
}

/// Load the policy snapshot in the background; the barrier waits on it.
///
/// A load failure leaves the decision point unsynced, which the barrier
/// reports as a timeout.
fn spawn_policy_sync(pdp: Arc<InMemoryDecisionPoint>, policy_file: Option<PathBuf>) {
    tokio::spawn(async move {
        let policy = match policy_file {
            Some(path) => match PolicySet::load(&path).await {
                Ok(policy) => policy,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "policy load failed");
                    return;
                }
            },
            None => PolicySet::default_bank(),
        };
        pdp.install(policy).await;
    });
}

fn principal_resolver(config: &ApiConfig) -> anyhow::Result<Arc<dyn PrincipalResolver>> {
    if let Some(secret) = &config.jwt_secret {
        return Ok(Arc::new(JwtPrincipalResolver::new(secret.as_bytes())));
    }

    tracing::warn!("JWT_SECRET not set; every request runs as the static dev principal");
    let principal = Principal::new(PrincipalId::new("user123")?)
        .with_name("John", "Doe")
        .with_email("john@example.com")
        .with_roles(vec![Role::new("customer")]);
    Ok(Arc::new(StaticPrincipalResolver::new(
        principal,
        config.tenant.clone(),
    )))
}
