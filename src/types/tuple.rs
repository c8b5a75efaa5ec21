//! Immutable, hashable tuples.

use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An unordered mapping from attribute name to value.
///
/// Backed by an ordered map so that equality, hashing, and iteration are
/// canonical regardless of construction order. Tuples are never mutated;
/// every transformation returns a new tuple.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tuple {
    attrs: BTreeMap<String, Value>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attrs.get(attr)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.attrs.contains_key(attr)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The tuple's attribute names, in canonical order.
    pub fn attributes(&self) -> BTreeSet<String> {
        self.attrs.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    /// Keep only the named attributes. Absent names are ignored here; the
    /// relation-level operation validates them against the schema first.
    pub fn project(&self, attrs: &BTreeSet<String>) -> Tuple {
        Tuple {
            attrs: self
                .attrs
                .iter()
                .filter(|(k, _)| attrs.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Drop the named attributes.
    pub fn without(&self, attrs: &BTreeSet<String>) -> Tuple {
        Tuple {
            attrs: self
                .attrs
                .iter()
                .filter(|(k, _)| !attrs.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// A new tuple with additional attributes.
    pub fn extend(&self, new_attrs: impl IntoIterator<Item = (String, Value)>) -> Tuple {
        let mut attrs = self.attrs.clone();
        attrs.extend(new_attrs);
        Tuple { attrs }
    }

    /// Apply a simultaneous old-name to new-name substitution.
    pub fn rename(&self, mapping: &BTreeMap<String, String>) -> Tuple {
        Tuple {
            attrs: self
                .attrs
                .iter()
                .map(|(k, v)| {
                    let name = mapping.get(k).unwrap_or(k);
                    (name.clone(), v.clone())
                })
                .collect(),
        }
    }

    /// Do the two tuples agree on every attribute they share?
    pub fn matches(&self, other: &Tuple) -> bool {
        self.attrs.iter().all(|(k, v)| match other.get(k) {
            Some(w) => v == w,
            None => true,
        })
    }

    /// Combine two tuples; shared attributes must already agree.
    pub fn merge(&self, other: &Tuple) -> Tuple {
        let mut attrs = self.attrs.clone();
        for (k, v) in &other.attrs {
            attrs.insert(k.clone(), v.clone());
        }
        Tuple { attrs }
    }
}

impl FromIterator<(String, Value)> for Tuple {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Tuple {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (k, v)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(pairs: &[(&str, i64)]) -> Tuple {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Integer(*v)))
            .collect()
    }

    #[test]
    fn equality_ignores_construction_order() {
        let a: Tuple = [
            ("x".to_string(), Value::Integer(1)),
            ("y".to_string(), Value::Integer(2)),
        ]
        .into_iter()
        .collect();
        let b: Tuple = [
            ("y".to_string(), Value::Integer(2)),
            ("x".to_string(), Value::Integer(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn matches_on_shared_attributes() {
        let a = tuple(&[("id", 1), ("x", 5)]);
        let b = tuple(&[("id", 1), ("y", 9)]);
        let c = tuple(&[("id", 2), ("y", 9)]);
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        // Disjoint tuples vacuously match.
        assert!(tuple(&[("p", 1)]).matches(&tuple(&[("q", 2)])));
    }

    #[test]
    fn rename_swaps_simultaneously() {
        let t = tuple(&[("a", 1), ("b", 2)]);
        let mapping: BTreeMap<String, String> = [
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
        ]
        .into_iter()
        .collect();
        let r = t.rename(&mapping);
        assert_eq!(r.get("a"), Some(&Value::Integer(2)));
        assert_eq!(r.get("b"), Some(&Value::Integer(1)));
    }
}
