//! Resource references: `kind:id` keys naming the object being accessed.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use accessgate_core::AccountId;

/// Separator between the kind tag and the instance id in the canonical key.
pub const SEPARATOR: char = ':';

/// Type tag plus instance identifier (e.g. `account` / `42`).
///
/// The kind never contains the separator, so splitting the canonical key at
/// the first `:` is unambiguous and two refs share a key only if they are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    kind: String,
    id: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceRefError {
    #[error("resource kind must not be empty")]
    EmptyKind,

    #[error("resource kind '{0}' must not contain ':'")]
    InvalidKind(String),

    #[error("resource id must not be empty")]
    EmptyId,

    #[error("'{0}' is not a 'kind:id' resource key")]
    Malformed(String),
}

impl ResourceRef {
    pub const ACCOUNT: &'static str = "account";

    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Result<Self, ResourceRefError> {
        let kind = kind.into();
        let id = id.into();
        if kind.trim().is_empty() {
            return Err(ResourceRefError::EmptyKind);
        }
        if kind.contains(SEPARATOR) {
            return Err(ResourceRefError::InvalidKind(kind));
        }
        if id.trim().is_empty() {
            return Err(ResourceRefError::EmptyId);
        }
        Ok(Self { kind, id })
    }

    /// Reference to a bank account. Infallible: `AccountId` is already validated.
    pub fn account(id: &AccountId) -> Self {
        Self {
            kind: Self::ACCOUNT.to_string(),
            id: id.as_str().to_string(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical `kind:id` key sent to the decision point.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.kind, SEPARATOR, self.id)
    }
}

impl core::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}{}", self.kind, SEPARATOR, self.id)
    }
}

impl FromStr for ResourceRef {
    type Err = ResourceRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| ResourceRefError::Malformed(s.to_string()))?;
        Self::new(kind, id)
    }
}

impl Serialize for ResourceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn account_ref_has_expected_key() {
        let account = AccountId::parse("42").unwrap();
        let r = ResourceRef::account(&account);
        assert_eq!(r.key(), "account:42");
        assert_eq!(r.kind(), "account");
        assert_eq!(r.id(), "42");
    }

    #[test]
    fn rejects_empty_parts_and_bad_kind() {
        assert_eq!(ResourceRef::new("", "1"), Err(ResourceRefError::EmptyKind));
        assert_eq!(ResourceRef::new("account", " "), Err(ResourceRefError::EmptyId));
        assert!(matches!(
            ResourceRef::new("a:b", "1"),
            Err(ResourceRefError::InvalidKind(_))
        ));
        assert!(matches!(
            "no-separator".parse::<ResourceRef>(),
            Err(ResourceRefError::Malformed(_))
        ));
    }

    #[test]
    fn id_may_contain_separator() {
        let r: ResourceRef = "doc:a:b".parse().unwrap();
        assert_eq!(r.kind(), "doc");
        assert_eq!(r.id(), "a:b");
    }

    proptest! {
        #[test]
        fn key_parses_back_to_same_ref(kind in "[a-z_]{1,12}", id in "[A-Za-z0-9:_-]{1,16}") {
            prop_assume!(!id.trim().is_empty());
            let r = ResourceRef::new(kind, id).unwrap();
            let parsed: ResourceRef = r.key().parse().unwrap();
            prop_assert_eq!(parsed, r);
        }

        #[test]
        fn distinct_refs_have_distinct_keys(
            a in ("[a-z]{1,4}", "[a-z0-9:]{1,4}"),
            b in ("[a-z]{1,4}", "[a-z0-9:]{1,4}"),
        ) {
            let ra = ResourceRef::new(a.0, a.1).unwrap();
            let rb = ResourceRef::new(b.0, b.1).unwrap();
            prop_assert_eq!(ra == rb, ra.key() == rb.key());
        }
    }
}
