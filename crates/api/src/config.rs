//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use accessgate_auth::{IndeterminatePolicy, SyncFailureMode};
use accessgate_core::TenantId;
use accessgate_observability::LogFormat;

pub const ENV_BIND: &str = "ACCESSGATE_BIND";
pub const ENV_TENANT: &str = "ACCESSGATE_TENANT";
pub const ENV_SYNC_TIMEOUT_MS: &str = "ACCESSGATE_SYNC_TIMEOUT_MS";
pub const ENV_SYNC_FAILURE: &str = "ACCESSGATE_SYNC_FAILURE";
pub const ENV_DECISION_TIMEOUT_MS: &str = "ACCESSGATE_DECISION_TIMEOUT_MS";
pub const ENV_INDETERMINATE: &str = "ACCESSGATE_INDETERMINATE";
pub const ENV_POLICY_FILE: &str = "ACCESSGATE_POLICY_FILE";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_LOG_FORMAT: &str = "ACCESSGATE_LOG_FORMAT";

const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    pub tenant: TenantId,
    pub sync_timeout: Duration,
    pub sync_failure: SyncFailureMode,
    pub decision_timeout: Option<Duration>,
    pub indeterminate: IndeterminatePolicy,
    pub policy_file: Option<PathBuf>,
    /// Enables bearer-token principal resolution. Unset: static dev principal.
    pub jwt_secret: Option<String>,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind", &self.bind)
            .field("tenant", &self.tenant)
            .field("sync_timeout", &self.sync_timeout)
            .field("sync_failure", &self.sync_failure)
            .field("decision_timeout", &self.decision_timeout)
            .field("indeterminate", &self.indeterminate)
            .field("policy_file", &self.policy_file)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = parse_with(ENV_BIND, get(ENV_BIND), |v| {
            v.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?
        .unwrap_or_else(default_bind);

        let tenant = parse_with(ENV_TENANT, get(ENV_TENANT), |v| {
            TenantId::parse(v).map_err(|e| e.to_string())
        })?
        .unwrap_or_else(TenantId::default_tenant);

        let sync_timeout = parse_with(ENV_SYNC_TIMEOUT_MS, get(ENV_SYNC_TIMEOUT_MS), millis)?
            .unwrap_or(DEFAULT_SYNC_TIMEOUT);

        let sync_failure: SyncFailureMode =
            parse_with(ENV_SYNC_FAILURE, get(ENV_SYNC_FAILURE), str::parse)?.unwrap_or_default();

        let decision_timeout =
            parse_with(ENV_DECISION_TIMEOUT_MS, get(ENV_DECISION_TIMEOUT_MS), millis)?;

        let indeterminate: IndeterminatePolicy =
            parse_with(ENV_INDETERMINATE, get(ENV_INDETERMINATE), str::parse)?.unwrap_or_default();

        let log_format: LogFormat =
            parse_with(ENV_LOG_FORMAT, get(ENV_LOG_FORMAT), str::parse)?.unwrap_or_default();

        Ok(Self {
            bind,
            tenant,
            sync_timeout,
            sync_failure,
            decision_timeout,
            indeterminate,
            policy_file: get(ENV_POLICY_FILE).map(PathBuf::from),
            jwt_secret: get(ENV_JWT_SECRET),
            log_format,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tenant: TenantId::default_tenant(),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            sync_failure: SyncFailureMode::default(),
            decision_timeout: None,
            indeterminate: IndeterminatePolicy::default(),
            policy_file: None,
            jwt_secret: None,
            log_format: LogFormat::default(),
        }
    }
}

fn parse_with<T>(
    key: &'static str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        parse(&value).map_err(|reason| ConfigError {
            key,
            value: value.clone(),
            reason,
        })
    })
    .transpose()
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn millis(raw: &str) -> Result<Duration, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.tenant, TenantId::default_tenant());
        assert_eq!(cfg.sync_timeout, Duration::from_secs(5));
        assert_eq!(cfg.sync_failure, SyncFailureMode::Abort);
        assert_eq!(cfg.indeterminate, IndeterminatePolicy::Deny);
        assert_eq!(cfg.decision_timeout, None);
        assert!(cfg.jwt_secret.is_none());
    }

    #[test]
    fn explicit_values_are_parsed() {
        let cfg = config(&[
            (ENV_BIND, "127.0.0.1:9000"),
            (ENV_TENANT, "acme"),
            (ENV_SYNC_TIMEOUT_MS, "250"),
            (ENV_SYNC_FAILURE, "degraded"),
            (ENV_DECISION_TIMEOUT_MS, "40"),
            (ENV_INDETERMINATE, "allow"),
            (ENV_POLICY_FILE, "/etc/accessgate/policy.json"),
            (ENV_JWT_SECRET, "s3cret"),
            (ENV_LOG_FORMAT, "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.tenant.as_str(), "acme");
        assert_eq!(cfg.sync_timeout, Duration::from_millis(250));
        assert_eq!(cfg.sync_failure, SyncFailureMode::Degraded);
        assert_eq!(cfg.decision_timeout, Some(Duration::from_millis(40)));
        assert_eq!(cfg.indeterminate, IndeterminatePolicy::Allow);
        assert_eq!(cfg.policy_file, Some(PathBuf::from("/etc/accessgate/policy.json")));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = config(&[(ENV_SYNC_TIMEOUT_MS, "soon")]).unwrap_err();
        assert_eq!(err.key, ENV_SYNC_TIMEOUT_MS);

        let err = config(&[(ENV_SYNC_FAILURE, "ignore")]).unwrap_err();
        assert_eq!(err.key, ENV_SYNC_FAILURE);

        let err = config(&[(ENV_DECISION_TIMEOUT_MS, "0")]).unwrap_err();
        assert_eq!(err.key, ENV_DECISION_TIMEOUT_MS);
    }
}
