use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Tagged event record dispatched into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Action {
            kind: kind.into(),
            payload,
        }
    }

    /// Action carrying no payload.
    pub fn bare(kind: impl Into<String>) -> Self {
        Action::new(kind, Value::Null)
    }
}

/// Pattern a watch registration or `take` matches actions against.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPattern {
    /// Match every action.
    Any,
    /// Match actions with this exact kind tag.
    Kind(String),
}

impl ActionPattern {
    pub fn kind(kind: impl Into<String>) -> Self {
        ActionPattern::Kind(kind.into())
    }

    pub fn matches(&self, action: &Action) -> bool {
        match self {
            ActionPattern::Any => true,
            ActionPattern::Kind(kind) => action.kind == *kind,
        }
    }
}

impl From<&str> for ActionPattern {
    fn from(kind: &str) -> Self {
        ActionPattern::Kind(kind.to_string())
    }
}

impl From<String> for ActionPattern {
    fn from(kind: String) -> Self {
        ActionPattern::Kind(kind)
    }
}
