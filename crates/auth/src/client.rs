//! The decision client capability consumed by the gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Decision, DecisionQuery};

/// Failure to obtain a decision. Never a negative decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// The decision point could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The decision point answered with something that is not a decision.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No answer within the allotted time.
    #[error("decision timed out after {0:?}")]
    Timeout(Duration),

    /// The decision point has not completed its initial sync (degraded start).
    #[error("decision point has not completed its initial sync")]
    NotSynced,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Opaque policy decision point.
///
/// Any conforming provider may be plugged in (in-memory table, sidecar PDP,
/// remote service). Retries, caching and connection pooling, if any, live
/// behind this trait.
#[async_trait]
pub trait DecisionClient: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Evaluate one query.
    async fn check_access(&self, query: &DecisionQuery) -> Result<Decision, DecisionError>;

    /// Wait until local policy state is fresh enough to answer, up to `timeout`.
    ///
    /// Returns `true` once synced, `false` if the timeout elapsed first.
    async fn await_sync(&self, timeout: Duration) -> bool;
}

#[async_trait]
impl<T> DecisionClient for Arc<T>
where
    T: DecisionClient + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn check_access(&self, query: &DecisionQuery) -> Result<Decision, DecisionError> {
        (**self).check_access(query).await
    }

    async fn await_sync(&self, timeout: Duration) -> bool {
        (**self).await_sync(timeout).await
    }
}
