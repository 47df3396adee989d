//! The authorization gate: single chokepoint in front of every protected operation.
//!
//! - No caching (each call issues a fresh query)
//! - No retries (those belong to the decision client)
//! - No shared mutable state (safe to clone into every handler)

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    Action, Decision, DecisionClient, DecisionContext, DecisionError, DecisionQuery,
    IndeterminatePolicy, Principal, ResourceRef,
};

/// Whether the gate consults the decision client at all.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GateMode {
    #[default]
    Normal,
    /// Startup sync never completed and the host chose to start anyway:
    /// every protected call is refused as unavailable.
    ConservativeDeny,
}

/// Immutable gate settings, fixed at boot.
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    pub indeterminate: IndeterminatePolicy,
    /// Upper bound on a single decision call. `None` leaves it to the client.
    pub decision_timeout: Option<Duration>,
    pub mode: GateMode,
}

impl GateConfig {
    pub fn with_indeterminate(mut self, policy: IndeterminatePolicy) -> Self {
        self.indeterminate = policy;
        self
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = Some(timeout);
        self
    }

    pub fn with_mode(mut self, mode: GateMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No principal was resolved for the request. Not a policy decision.
    #[error("no authenticated principal")]
    Unauthenticated,

    /// The decision point evaluated the query and said no (or could not decide).
    #[error("access denied: '{action}' on '{resource}' ({decision})")]
    AccessDenied {
        action: Action,
        resource: ResourceRef,
        decision: Decision,
    },

    /// The decision point could not be consulted; the requester's status is unknown.
    #[error("authorization decision unavailable: {0}")]
    DecisionUnavailable(#[from] DecisionError),
}

/// Stable label for each way a protected call can end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GateOutcome {
    Allowed,
    Denied,
    Unauthenticated,
    Unavailable,
}

impl GateOutcome {
    pub const ALL: [GateOutcome; 4] = [
        GateOutcome::Allowed,
        GateOutcome::Denied,
        GateOutcome::Unauthenticated,
        GateOutcome::Unavailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GateOutcome::Allowed => "allowed",
            GateOutcome::Denied => "denied",
            GateOutcome::Unauthenticated => "unauthenticated",
            GateOutcome::Unavailable => "unavailable",
        }
    }
}

impl GateError {
    pub fn outcome(&self) -> GateOutcome {
        match self {
            GateError::Unauthenticated => GateOutcome::Unauthenticated,
            GateError::AccessDenied { .. } => GateOutcome::Denied,
            GateError::DecisionUnavailable(_) => GateOutcome::Unavailable,
        }
    }
}

/// Policy enforcement point wrapping an injected [`DecisionClient`].
///
/// Constructed once at boot (after the startup barrier) and cloned into
/// request handlers; clones share the client through an `Arc`.
#[derive(Clone)]
pub struct AuthorizationGate {
    client: Arc<dyn DecisionClient>,
    config: GateConfig,
}

impl core::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}

impl AuthorizationGate {
    pub fn new(client: Arc<dyn DecisionClient>) -> Self {
        Self::with_config(client, GateConfig::default())
    }

    pub fn with_config(client: Arc<dyn DecisionClient>, config: GateConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn mode(&self) -> GateMode {
        self.config.mode
    }

    /// Ask the decision point whether `principal` may perform `action` on `resource`.
    ///
    /// Returns the permitting decision (`Allow`, or `Indeterminate` when
    /// explicitly configured to pass). A missing principal fails before any
    /// client call is made.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        action: &Action,
        resource: &ResourceRef,
        context: DecisionContext,
    ) -> Result<Decision, GateError> {
        let Some(principal) = principal else {
            return Err(unauthenticated(action, resource));
        };

        let query = DecisionQuery::new(
            principal.id().clone(),
            action.clone(),
            resource.clone(),
            context,
        );

        if self.config.mode == GateMode::ConservativeDeny {
            warn!(
                query_id = %query.query_id(),
                outcome = GateOutcome::Unavailable.as_str(),
                principal = %query.principal_id(),
                action = %query.action(),
                resource = %query.resource(),
                "authorization refused: gate running in conservative-deny mode"
            );
            return Err(GateError::DecisionUnavailable(DecisionError::NotSynced));
        }

        let decision = match self.decide(&query).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(
                    query_id = %query.query_id(),
                    outcome = GateOutcome::Unavailable.as_str(),
                    client = self.client.name(),
                    principal = %query.principal_id(),
                    action = %query.action(),
                    resource = %query.resource(),
                    error = %e,
                    "decision client failed"
                );
                return Err(GateError::DecisionUnavailable(e));
            }
        };

        if self.config.indeterminate.permits(decision) {
            debug!(
                query_id = %query.query_id(),
                outcome = GateOutcome::Allowed.as_str(),
                principal = %query.principal_id(),
                action = %query.action(),
                resource = %query.resource(),
                decision = %decision,
                "access granted"
            );
            return Ok(decision);
        }

        info!(
            query_id = %query.query_id(),
            outcome = GateOutcome::Denied.as_str(),
            principal = %query.principal_id(),
            action = %query.action(),
            resource = %query.resource(),
            decision = %decision,
            "access denied"
        );
        Err(GateError::AccessDenied {
            action: action.clone(),
            resource: resource.clone(),
            decision,
        })
    }

    /// Run `op` only if the principal is authorized; it is called at most once.
    ///
    /// The operation receives the resolved principal. Dropping the returned
    /// future before the decision arrives cancels the decision call.
    pub async fn protect<T, F, Fut>(
        &self,
        principal: Option<&Principal>,
        action: &Action,
        resource: &ResourceRef,
        context: DecisionContext,
        op: F,
    ) -> Result<T, GateError>
    where
        F: FnOnce(&Principal) -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(principal) = principal else {
            return Err(unauthenticated(action, resource));
        };

        self.authorize(Some(principal), action, resource, context).await?;
        Ok(op(principal).await)
    }

    async fn decide(&self, query: &DecisionQuery) -> Result<Decision, DecisionError> {
        match self.config.decision_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.check_access(query))
                .await
                .map_err(|_| DecisionError::Timeout(limit))?,
            None => self.client.check_access(query).await,
        }
    }
}

fn unauthenticated(action: &Action, resource: &ResourceRef) -> GateError {
    info!(
        outcome = GateOutcome::Unauthenticated.as_str(),
        action = %action,
        resource = %resource,
        "authorization refused: no principal"
    );
    GateError::Unauthenticated
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::PrincipalId;

    /// Decision client returning a fixed answer and recording every query.
    struct ScriptedClient {
        answer: Result<Decision, DecisionError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        seen: Mutex<Vec<DecisionQuery>>,
    }

    impl ScriptedClient {
        fn answering(answer: Result<Decision, DecisionError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                delay: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn slow(answer: Decision, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DecisionClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn check_access(&self, query: &DecisionQuery) -> Result<Decision, DecisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(query.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer.clone()
        }

        async fn await_sync(&self, _timeout: Duration) -> bool {
            true
        }
    }

    fn user() -> Principal {
        Principal::new(PrincipalId::new("user123").unwrap())
            .with_name("John", "Doe")
            .with_roles(vec![crate::Role::new("customer")])
    }

    fn account() -> ResourceRef {
        ResourceRef::new("account", "42").unwrap()
    }

    fn transfer_context(amount: f64) -> DecisionContext {
        DecisionContext::new()
            .with("tenant", "default")
            .unwrap()
            .resource_attributes(
                &account(),
                [
                    ("owner_id".to_string(), json!("42")),
                    ("amount".to_string(), json!(amount)),
                ],
            )
    }

    #[tokio::test]
    async fn missing_principal_never_reaches_the_client() {
        let client = ScriptedClient::answering(Ok(Decision::Allow));
        let gate = AuthorizationGate::new(client.clone());

        let err = gate
            .authorize(None, &Action::READ, &account(), DecisionContext::new())
            .await
            .unwrap_err();

        assert_eq!(err, GateError::Unauthenticated);
        assert_eq!(err.outcome(), GateOutcome::Unauthenticated);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn allow_passes_query_through_unchanged() {
        let client = ScriptedClient::answering(Ok(Decision::Allow));
        let gate = AuthorizationGate::new(client.clone());
        let principal = user();

        let decision = gate
            .authorize(Some(&principal), &Action::TRANSFER, &account(), transfer_context(10.0))
            .await
            .unwrap();

        assert_eq!(decision, Decision::Allow);
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].principal_id().as_str(), "user123");
        assert_eq!(seen[0].action(), &Action::TRANSFER);
        assert_eq!(seen[0].resource().key(), "account:42");
        assert_eq!(seen[0].context(), &transfer_context(10.0));
    }

    #[tokio::test]
    async fn deny_and_indeterminate_are_access_denied() {
        for answer in [Decision::Deny, Decision::Indeterminate] {
            let gate = AuthorizationGate::new(ScriptedClient::answering(Ok(answer)));
            let err = gate
                .authorize(Some(&user()), &Action::READ, &account(), DecisionContext::new())
                .await
                .unwrap_err();

            assert_eq!(err.outcome(), GateOutcome::Denied);
            assert!(matches!(err, GateError::AccessDenied { decision, .. } if decision == answer));
        }
    }

    #[tokio::test]
    async fn indeterminate_can_be_explicitly_allowed() {
        let gate = AuthorizationGate::with_config(
            ScriptedClient::answering(Ok(Decision::Indeterminate)),
            GateConfig::default().with_indeterminate(IndeterminatePolicy::Allow),
        );

        let decision = gate
            .authorize(Some(&user()), &Action::READ, &account(), DecisionContext::new())
            .await
            .unwrap();
        assert_eq!(decision, Decision::Indeterminate);
    }

    #[tokio::test]
    async fn client_failure_is_unavailable_not_denied() {
        let failure = DecisionError::Transport("connection refused".to_string());
        let gate = AuthorizationGate::new(ScriptedClient::answering(Err(failure.clone())));

        let err = gate
            .authorize(Some(&user()), &Action::READ, &account(), DecisionContext::new())
            .await
            .unwrap_err();

        assert_eq!(err, GateError::DecisionUnavailable(failure));
        assert_eq!(err.outcome(), GateOutcome::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_client_times_out_as_unavailable() {
        let client = ScriptedClient::slow(Decision::Allow, Duration::from_secs(5));
        let gate = AuthorizationGate::with_config(
            client,
            GateConfig::default().with_decision_timeout(Duration::from_millis(200)),
        );

        let err = gate
            .authorize(Some(&user()), &Action::READ, &account(), DecisionContext::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GateError::DecisionUnavailable(DecisionError::Timeout(Duration::from_millis(200)))
        );
    }

    #[tokio::test]
    async fn conservative_deny_mode_skips_the_client() {
        let client = ScriptedClient::answering(Ok(Decision::Allow));
        let gate = AuthorizationGate::with_config(
            client.clone(),
            GateConfig::default().with_mode(GateMode::ConservativeDeny),
        );

        let err = gate
            .authorize(Some(&user()), &Action::READ, &account(), DecisionContext::new())
            .await
            .unwrap_err();

        assert_eq!(err, GateError::DecisionUnavailable(DecisionError::NotSynced));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn protect_runs_operation_once_on_allow() {
        let gate = AuthorizationGate::new(ScriptedClient::answering(Ok(Decision::Allow)));
        let runs = AtomicUsize::new(0);
        let principal = user();

        let name = gate
            .protect(Some(&principal), &Action::READ, &account(), DecisionContext::new(), |p| {
                runs.fetch_add(1, Ordering::SeqCst);
                let name = p.display_name();
                async move { name }
            })
            .await
            .unwrap();

        assert_eq!(name, "John Doe");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn protect_without_principal_skips_operation() {
        let client = ScriptedClient::answering(Ok(Decision::Allow));
        let gate = AuthorizationGate::new(client.clone());
        let runs = AtomicUsize::new(0);

        let err = gate
            .protect(None, &Action::READ, &account(), DecisionContext::new(), |_| {
                runs.fetch_add(1, Ordering::SeqCst);
                async {}
            })
            .await
            .unwrap_err();

        assert_eq!(err, GateError::Unauthenticated);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(client.calls(), 0);
    }

    fn arb_context() -> impl Strategy<Value = DecisionContext> {
        prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6).prop_map(|attrs| {
            let mut ctx = DecisionContext::new();
            for (key, value) in attrs {
                // Reserved keys are rejected; the rest is pass-through.
                let _ = ctx.insert(key, value);
            }
            ctx
        })
    }

    fn run<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #[test]
        fn negative_decisions_never_run_the_operation(
            ctx in arb_context(),
            answer in prop_oneof![Just(Decision::Deny), Just(Decision::Indeterminate)],
        ) {
            let gate = AuthorizationGate::new(ScriptedClient::answering(Ok(answer)));
            let runs = AtomicUsize::new(0);
            let principal = user();

            let result = run(gate.protect(Some(&principal), &Action::TRANSFER, &account(), ctx, |_| {
                runs.fetch_add(1, Ordering::SeqCst);
                async {}
            }));

            prop_assert!(matches!(result, Err(GateError::AccessDenied { .. })), "expected AccessDenied");
            prop_assert_eq!(runs.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn allow_runs_the_operation_exactly_once(ctx in arb_context()) {
            let client = ScriptedClient::answering(Ok(Decision::Allow));
            let gate = AuthorizationGate::new(client.clone());
            let runs = AtomicUsize::new(0);
            let principal = user();

            let result = run(gate.protect(Some(&principal), &Action::READ, &account(), ctx.clone(), |_| {
                runs.fetch_add(1, Ordering::SeqCst);
                async {}
            }));

            prop_assert!(result.is_ok());
            prop_assert_eq!(runs.load(Ordering::SeqCst), 1);
            prop_assert_eq!(client.calls(), 1);
            let seen = client.seen.lock().unwrap();
            prop_assert_eq!(seen[0].context(), &ctx);
        }
    }
}
