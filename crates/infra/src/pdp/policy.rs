//! Static grant tables for the in-memory decision point.
//!
//! Not a policy language: a grant is a flat
//! (subject, action, resource kind) triple with at most one amount ceiling.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use accessgate_auth::{Action, DecisionContext, PrincipalId, ResourceRef, Role};

/// Who a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subject {
    Principal(PrincipalId),
    Role(Role),
}

impl TryFrom<String> for Subject {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some(("principal", id)) => PrincipalId::new(id)
                .map(Subject::Principal)
                .map_err(|e| e.to_string()),
            Some(("role", name)) if !name.trim().is_empty() => {
                Ok(Subject::Role(Role::new(name.to_string())))
            }
            _ => Err(format!("subject '{value}' must be 'principal:<id>' or 'role:<name>'")),
        }
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        match value {
            Subject::Principal(id) => format!("principal:{id}"),
            Subject::Role(role) => format!("role:{role}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub subject: Subject,
    pub action: Action,
    pub resource_kind: String,
    /// Ceiling on `resource.amount` in the decision context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
}

/// Outcome of checking one grant against a query's context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum GrantMatch {
    Satisfied,
    Violated,
    /// The grant needs an attribute the context does not carry.
    MissingAttribute,
}

impl Grant {
    pub(crate) fn check(&self, context: &DecisionContext) -> GrantMatch {
        let Some(max) = self.max_amount else {
            return GrantMatch::Satisfied;
        };
        match context.pointer("/resource/amount").and_then(|v| v.as_f64()) {
            Some(amount) if amount <= max => GrantMatch::Satisfied,
            Some(_) => GrantMatch::Violated,
            None => GrantMatch::MissingAttribute,
        }
    }

    pub(crate) fn covers(
        &self,
        subjects: &[Subject],
        action: &Action,
        resource: &ResourceRef,
    ) -> bool {
        self.action == *action
            && self.resource_kind == resource.kind()
            && subjects.contains(&self.subject)
    }
}

#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Role assignments plus grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    /// principal id → roles, as known to the decision point.
    #[serde(default)]
    pub assignments: BTreeMap<String, Vec<Role>>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl PolicySet {
    /// Built-in demo policy: `user123` is a customer who may read accounts and
    /// transfer up to 1000.
    pub fn default_bank() -> Self {
        let customer = Subject::Role(Role::new("customer"));
        Self {
            assignments: BTreeMap::from([("user123".to_string(), vec![Role::new("customer")])]),
            grants: vec![
                Grant {
                    subject: customer.clone(),
                    action: Action::READ,
                    resource_kind: ResourceRef::ACCOUNT.to_string(),
                    max_amount: None,
                },
                Grant {
                    subject: customer,
                    action: Action::TRANSFER,
                    resource_kind: ResourceRef::ACCOUNT.to_string(),
                    max_amount: Some(1000.0),
                },
            ],
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, PolicyLoadError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Subjects a principal acts as: itself plus its assigned roles.
    pub(crate) fn subjects_of(&self, principal: &PrincipalId) -> Vec<Subject> {
        let mut subjects = vec![Subject::Principal(principal.clone())];
        if let Some(roles) = self.assignments.get(principal.as_str()) {
            subjects.extend(roles.iter().cloned().map(Subject::Role));
        }
        subjects
    }

    pub(crate) fn knows_kind(&self, kind: &str) -> bool {
        self.grants.iter().any(|g| g.resource_kind == kind)
    }
}
