//! Variable environment
//!
//! One flat table per top-level invocation. Nested `if`/`loop` bodies share
//! it; a high-level skill expansion starts from an empty one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::Value;

/// Marker that starts every variable reference
pub const VARIABLE_PREFIX: char = '_';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind `name`, replacing any earlier binding
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }
}

impl From<HashMap<String, Value>> for Environment {
    fn from(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl FromIterator<(String, Value)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Whether a token refers to a variable
pub fn is_variable(token: &str) -> bool {
    token.starts_with(VARIABLE_PREFIX)
}
