//! Decision context: open attribute map passed through to the decision point.
//!
//! The gate assembles context but never interprets it. The only rule enforced
//! here is that context cannot carry identity or action fields, which travel
//! in dedicated query slots.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use accessgate_core::TenantId;

use crate::ResourceRef;

/// Top-level keys that would shadow the query's own principal/action slots.
pub const RESERVED_KEYS: &[&str] = &["user", "subject", "principal", "action"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context key '{0}' is reserved")]
    ReservedKey(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct DecisionContext(Map<String, Value>);

impl DecisionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `tenant` attribute.
    pub fn tenant(mut self, tenant: &TenantId) -> Self {
        self.0
            .insert("tenant".to_string(), Value::String(tenant.to_string()));
        self
    }

    /// Set the `resource` object: `{ "type": <kind>, ...attributes }`.
    ///
    /// Existing `resource` attributes are kept unless overwritten here.
    pub fn resource_attributes(
        mut self,
        resource: &ResourceRef,
        attributes: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut object = Map::new();
        object.insert("type".to_string(), Value::String(resource.kind().to_string()));
        object.extend(attributes);

        merge_value(
            self.0
                .entry("resource")
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Object(object),
        );
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ContextError> {
        let key = key.into();
        if is_reserved(&key) {
            return Err(ContextError::ReservedKey(key));
        }
        self.0.insert(key, value.into());
        Ok(())
    }

    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ContextError> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Merge dynamic (request-time) attributes over static call-site ones.
    ///
    /// Nested objects merge key by key; any other value in `other` replaces
    /// the existing one.
    pub fn merge(mut self, other: DecisionContext) -> Self {
        for (key, value) in other.0 {
            match self.0.get_mut(&key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.0.insert(key, value);
                }
            }
        }
        self
    }

    /// JSON pointer lookup, e.g. `/resource/amount`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('/')?;
        match path.split_once('/') {
            Some((head, tail)) => self.0.get(head)?.pointer(&format!("/{tail}")),
            None => self.0.get(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key))
}

fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

impl TryFrom<Map<String, Value>> for DecisionContext {
    type Error = ContextError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        if let Some(key) = map.keys().find(|k| is_reserved(k)) {
            return Err(ContextError::ReservedKey(key.clone()));
        }
        Ok(Self(map))
    }
}

impl From<DecisionContext> for Map<String, Value> {
    fn from(value: DecisionContext) -> Self {
        value.0
    }
}
