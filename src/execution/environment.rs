//! The environment: named relation variables.

use crate::error::{Error, Result};
use crate::types::Relation;
use std::collections::BTreeMap;

/// A mutable mapping from relation name to relation.
///
/// This is the only mutable state in the system, and the driver touches it
/// only between queries; evaluation takes it by shared reference.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: BTreeMap<String, Relation>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, relation: Relation) {
        self.bindings.insert(name.into(), relation);
    }

    pub fn lookup(&self, name: &str) -> Result<&Relation> {
        self.bindings
            .get(name)
            .ok_or_else(|| Error::UnknownRelation(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// All bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
