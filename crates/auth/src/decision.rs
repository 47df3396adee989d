use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome returned by a decision point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    /// The decision point could not reach a verdict (missing attributes,
    /// unknown resource type). Fail-closed unless configured otherwise.
    Indeterminate,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Indeterminate => "indeterminate",
        }
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the gate treats [`Decision::Indeterminate`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminatePolicy {
    #[default]
    Deny,
    Allow,
}

impl IndeterminatePolicy {
    /// Whether a decision lets the protected operation run.
    pub fn permits(self, decision: Decision) -> bool {
        match decision {
            Decision::Allow => true,
            Decision::Deny => false,
            Decision::Indeterminate => self == IndeterminatePolicy::Allow,
        }
    }
}

impl FromStr for IndeterminatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "allow" => Ok(Self::Allow),
            other => Err(format!("expected 'deny' or 'allow', got '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indeterminate_is_denied_by_default() {
        let policy = IndeterminatePolicy::default();
        assert!(policy.permits(Decision::Allow));
        assert!(!policy.permits(Decision::Deny));
        assert!(!policy.permits(Decision::Indeterminate));
    }

    #[test]
    fn explicit_allow_only_changes_indeterminate() {
        let policy = IndeterminatePolicy::Allow;
        assert!(policy.permits(Decision::Indeterminate));
        assert!(!policy.permits(Decision::Deny));
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Decision::Indeterminate).unwrap(), "\"indeterminate\"");
        let d: Decision = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(d, Decision::Allow);
    }
}
