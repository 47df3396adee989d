//! One-shot startup barrier: wait for the decision client's first sync before serving.

use core::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{DecisionClient, GateMode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("decision client '{client}' did not sync within {waited:?}")]
    Timeout { client: String, waited: Duration },
}

/// What to do when the startup barrier times out.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SyncFailureMode {
    /// Refuse to start (fail-closed).
    #[default]
    Abort,
    /// Start anyway with the gate refusing every protected call.
    Degraded,
}

impl FromStr for SyncFailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "degraded" => Ok(Self::Degraded),
            other => Err(format!("expected 'abort' or 'degraded', got '{other}'")),
        }
    }
}

/// Block until `client` reports a fresh policy snapshot, or `timeout` elapses.
///
/// Evaluated once at boot, never retried. The deadline is enforced here even
/// if the client ignores the timeout it is handed.
pub async fn await_ready(client: &dyn DecisionClient, timeout: Duration) -> Result<(), SyncError> {
    let started = Instant::now();
    let synced = tokio::time::timeout(timeout, client.await_sync(timeout))
        .await
        .unwrap_or(false);

    if synced {
        info!(
            client = client.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decision client synced"
        );
        Ok(())
    } else {
        Err(SyncError::Timeout {
            client: client.name().to_string(),
            waited: timeout,
        })
    }
}

/// Run the barrier and turn its result into the gate mode to boot with.
///
/// `Abort` surfaces the timeout to the caller, which should stop startup.
/// `Degraded` logs it and returns [`GateMode::ConservativeDeny`].
pub async fn resolve_startup(
    client: &dyn DecisionClient,
    timeout: Duration,
    on_failure: SyncFailureMode,
) -> Result<GateMode, SyncError> {
    match await_ready(client, timeout).await {
        Ok(()) => Ok(GateMode::Normal),
        Err(e) => match on_failure {
            SyncFailureMode::Abort => {
                error!(error = %e, "startup sync failed; aborting");
                Err(e)
            }
            SyncFailureMode::Degraded => {
                warn!(error = %e, "startup sync failed; serving in conservative-deny mode");
                Ok(GateMode::ConservativeDeny)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::{Decision, DecisionError, DecisionQuery};

    /// Client whose sync takes `sync_after`; `honours_timeout` controls whether
    /// it gives up on its own.
    struct SlowSync {
        sync_after: Duration,
        honours_timeout: bool,
        sync_calls: AtomicUsize,
    }

    impl SlowSync {
        fn new(sync_after: Duration, honours_timeout: bool) -> Self {
            Self {
                sync_after,
                honours_timeout,
                sync_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DecisionClient for SlowSync {
        fn name(&self) -> &str {
            "slow-sync"
        }

        async fn check_access(&self, _query: &DecisionQuery) -> Result<Decision, DecisionError> {
            Ok(Decision::Allow)
        }

        async fn await_sync(&self, timeout: Duration) -> bool {
            self.sync_calls.fetch_add(1, Ordering::SeqCst);
            if self.honours_timeout && self.sync_after > timeout {
                tokio::time::sleep(timeout).await;
                return false;
            }
            tokio::time::sleep(self.sync_after).await;
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_client_passes_the_barrier() {
        let client = SlowSync::new(Duration::from_millis(100), true);
        await_ready(&client, Duration::from_secs(1)).await.unwrap();
        assert_eq!(client.sync_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_reporting_not_ready_times_out() {
        let client = SlowSync::new(Duration::from_secs(10), true);
        let err = await_ready(&client, Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(
            err,
            SyncError::Timeout {
                client: "slow-sync".to_string(),
                waited: Duration::from_secs(1)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn barrier_enforces_deadline_on_misbehaving_client() {
        let client = SlowSync::new(Duration::from_secs(3600), false);
        let result = await_ready(&client, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(SyncError::Timeout { .. })));
        // One shot: no retry after the timeout.
        assert_eq!(client.sync_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_mode_decides_boot_outcome() {
        let client = SlowSync::new(Duration::from_secs(10), true);

        let aborted =
            resolve_startup(&client, Duration::from_secs(1), SyncFailureMode::Abort).await;
        assert!(aborted.is_err());

        let degraded =
            resolve_startup(&client, Duration::from_secs(1), SyncFailureMode::Degraded).await;
        assert_eq!(degraded, Ok(GateMode::ConservativeDeny));

        let fast = SlowSync::new(Duration::from_millis(1), true);
        let normal = resolve_startup(&fast, Duration::from_secs(1), SyncFailureMode::Abort).await;
        assert_eq!(normal, Ok(GateMode::Normal));
    }

    #[test]
    fn failure_mode_parses() {
        assert_eq!("abort".parse::<SyncFailureMode>(), Ok(SyncFailureMode::Abort));
        assert_eq!(" Degraded ".parse::<SyncFailureMode>(), Ok(SyncFailureMode::Degraded));
        assert!("ignore".parse::<SyncFailureMode>().is_err());
    }
}
