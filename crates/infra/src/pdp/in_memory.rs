use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use accessgate_auth::{Decision, DecisionClient, DecisionError, DecisionQuery};

use super::policy::{GrantMatch, PolicySet};

/// Local decision point answering from an in-memory [`PolicySet`].
///
/// Starts either synced (policy supplied up front) or pending, in which case
/// [`install`](Self::install) delivers the first snapshot and releases anyone
/// blocked in `await_sync`.
#[derive(Debug)]
pub struct InMemoryDecisionPoint {
    policy: RwLock<PolicySet>,
    synced_tx: watch::Sender<bool>,
}

impl InMemoryDecisionPoint {
    pub fn synced(policy: PolicySet) -> Self {
        let (synced_tx, _) = watch::channel(true);
        Self {
            policy: RwLock::new(policy),
            synced_tx,
        }
    }

    /// No policy yet: every query is refused with `NotSynced` until `install`.
    pub fn pending() -> Self {
        let (synced_tx, _) = watch::channel(false);
        Self {
            policy: RwLock::new(PolicySet::default()),
            synced_tx,
        }
    }

    /// Replace the policy snapshot and mark the decision point synced.
    pub async fn install(&self, policy: PolicySet) {
        let grants = policy.grants.len();
        *self.policy.write().await = policy;
        self.synced_tx.send_replace(true);
        info!(grants, "policy snapshot installed");
    }

    pub fn is_synced(&self) -> bool {
        *self.synced_tx.borrow()
    }
}

#[async_trait]
impl DecisionClient for InMemoryDecisionPoint {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn check_access(&self, query: &DecisionQuery) -> Result<Decision, DecisionError> {
        if !self.is_synced() {
            return Err(DecisionError::NotSynced);
        }

        let policy = self.policy.read().await;
        let resource = query.resource();

        if !policy.knows_kind(resource.kind()) {
            debug!(query_id = %query.query_id(), kind = resource.kind(), "unknown resource kind");
            return Ok(Decision::Indeterminate);
        }

        let subjects = policy.subjects_of(query.principal_id());
        let mut missing_attribute = false;
        for grant in policy
            .grants
            .iter()
            .filter(|g| g.covers(&subjects, query.action(), resource))
        {
            match grant.check(query.context()) {
                GrantMatch::Satisfied => return Ok(Decision::Allow),
                GrantMatch::Violated => {}
                GrantMatch::MissingAttribute => missing_attribute = true,
            }
        }

        if missing_attribute {
            Ok(Decision::Indeterminate)
        } else {
            Ok(Decision::Deny)
        }
    }

    async fn await_sync(&self, timeout: Duration) -> bool {
        let mut rx = self.synced_tx.subscribe();
        matches!(
            tokio::time::timeout(timeout, rx.wait_for(|synced| *synced)).await,
            Ok(Ok(_))
        )
    }
}
