use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the operation being attempted (e.g. "read", "transfer").
///
/// Actions are fixed per call site and never taken from user input, so the
/// well-known ones are constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Action(Cow<'static, str>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("action must not be empty")]
pub struct ActionError;

impl Action {
    pub const READ: Action = Action(Cow::Borrowed("read"));
    pub const TRANSFER: Action = Action(Cow::Borrowed("transfer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, ActionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ActionError);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Action {
    type Error = ActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.0.into_owned()
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
