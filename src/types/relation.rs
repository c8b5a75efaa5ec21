//! Relations: immutable sets of tuples with a first-class schema.

use crate::error::{Error, Result};
use crate::types::tuple::Tuple;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An unordered, duplicate-free set of tuples sharing one attribute set.
///
/// The schema is stored separately from the tuples so that an empty relation
/// still carries type information: projecting an empty input must produce a
/// relation with known attributes. Tuples live in an ordered set, which gives
/// deduplication, canonical iteration order, and structural hashing for free
/// (relations appear inside values, so they must themselves hash).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    schema: BTreeSet<String>,
    tuples: BTreeSet<Tuple>,
}

impl Relation {
    /// An empty relation with the given schema.
    pub fn empty(schema: BTreeSet<String>) -> Self {
        Relation {
            schema,
            tuples: BTreeSet::new(),
        }
    }

    /// Build a relation from tuples, validating that each conforms to the
    /// schema.
    pub fn from_tuples(
        schema: BTreeSet<String>,
        tuples: impl IntoIterator<Item = Tuple>,
    ) -> Result<Self> {
        let mut rel = Relation::empty(schema);
        for tuple in tuples {
            rel.insert(tuple)?;
        }
        Ok(rel)
    }

    /// Build a relation from tuples, inferring the schema from the first.
    /// An empty iterator yields the empty relation over the empty schema.
    pub fn infer(tuples: impl IntoIterator<Item = Tuple>) -> Result<Self> {
        let mut iter = tuples.into_iter();
        match iter.next() {
            None => Ok(Relation::default()),
            Some(first) => {
                let schema = first.attributes();
                let mut rel = Relation::empty(schema);
                rel.insert(first)?;
                for tuple in iter {
                    rel.insert(tuple)?;
                }
                Ok(rel)
            }
        }
    }

    fn insert(&mut self, tuple: Tuple) -> Result<()> {
        if tuple.attributes() != self.schema {
            return Err(Error::Schema(format!(
                "tuple attributes {:?} do not match schema {:?}",
                tuple.attributes(),
                self.schema
            )));
        }
        self.tuples.insert(tuple);
        Ok(())
    }

    pub fn schema(&self) -> &BTreeSet<String> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.tuples.contains(tuple)
    }

    /// Iterate tuples in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    fn check_attrs(&self, attrs: &[String], op: &str) -> Result<()> {
        for attr in attrs {
            if !self.schema.contains(attr) {
                return Err(Error::Schema(format!(
                    "cannot {} absent attribute {:?}",
                    op, attr
                )));
            }
        }
        Ok(())
    }

    /// Project: keep only the named attributes (`#`).
    pub fn project(&self, attrs: &[String]) -> Result<Relation> {
        self.check_attrs(attrs, "project")?;
        let keep: BTreeSet<String> = attrs.iter().cloned().collect();
        let tuples = self.tuples.iter().map(|t| t.project(&keep)).collect();
        Ok(Relation {
            schema: keep,
            tuples,
        })
    }

    /// Remove: keep all attributes except the named ones (`#!`).
    pub fn remove(&self, attrs: &[String]) -> Result<Relation> {
        self.check_attrs(attrs, "remove")?;
        let drop: BTreeSet<String> = attrs.iter().cloned().collect();
        let schema: BTreeSet<String> = self.schema.difference(&drop).cloned().collect();
        let tuples = self.tuples.iter().map(|t| t.without(&drop)).collect();
        Ok(Relation { schema, tuples })
    }

    /// Filter: retain tuples for which the predicate holds (`?`). The
    /// predicate may fail (bad attribute, mixed domains); the first failure
    /// aborts the whole operation.
    pub fn filter(&self, mut predicate: impl FnMut(&Tuple) -> Result<bool>) -> Result<Relation> {
        let mut tuples = BTreeSet::new();
        for tuple in &self.tuples {
            if predicate(tuple)? {
                tuples.insert(tuple.clone());
            }
        }
        Ok(Relation {
            schema: self.schema.clone(),
            tuples,
        })
    }

    /// Natural join (`*`): tuples agreeing on all shared attributes merge;
    /// disjoint schemas degenerate to the Cartesian product.
    pub fn natural_join(&self, other: &Relation) -> Relation {
        let schema: BTreeSet<String> = self.schema.union(&other.schema).cloned().collect();
        let mut tuples = BTreeSet::new();
        for left in &self.tuples {
            for right in &other.tuples {
                if left.matches(right) {
                    tuples.insert(left.merge(right));
                }
            }
        }
        Relation { schema, tuples }
    }

    /// Nest join (`*: R > alias`): every left tuple survives, carrying a
    /// relation-valued attribute with its matches projected onto the
    /// right-only attributes. No matches means an empty relation with the
    /// right schema, never a dropped tuple.
    pub fn nest_join(&self, other: &Relation, alias: &str) -> Result<Relation> {
        if self.schema.contains(alias) {
            return Err(Error::Schema(format!(
                "nest attribute {:?} collides with an existing attribute",
                alias
            )));
        }
        let inner_schema: BTreeSet<String> =
            other.schema.difference(&self.schema).cloned().collect();
        let mut schema = self.schema.clone();
        schema.insert(alias.to_owned());

        let mut tuples = BTreeSet::new();
        for left in &self.tuples {
            let matches = other
                .tuples
                .iter()
                .filter(|right| left.matches(right))
                .map(|right| right.project(&inner_schema))
                .collect();
            let nested = Relation {
                schema: inner_schema.clone(),
                tuples: matches,
            };
            tuples.insert(left.extend([(alias.to_owned(), Value::Relation(nested))]));
        }
        Ok(Relation { schema, tuples })
    }

    /// Unnest (`<: alias`): expand each tuple against the contents of its
    /// relation-valued attribute, dropping the attribute itself. A tuple
    /// with an empty nested relation contributes nothing.
    pub fn unnest(&self, alias: &str) -> Result<Relation> {
        if !self.schema.contains(alias) {
            return Err(Error::Schema(format!(
                "cannot unnest absent attribute {:?}",
                alias
            )));
        }
        let outer: BTreeSet<String> = self
            .schema
            .iter()
            .filter(|a| a.as_str() != alias)
            .cloned()
            .collect();

        let mut inner_schema: Option<BTreeSet<String>> = None;
        let mut expanded = Vec::new();
        let drop: BTreeSet<String> = [alias.to_owned()].into_iter().collect();
        for tuple in &self.tuples {
            let nested = match tuple.get(alias) {
                Some(Value::Relation(rel)) => rel,
                Some(other) => {
                    return Err(Error::Type(format!(
                        "cannot unnest {:?}: it holds a {}, not a relation",
                        alias,
                        other.type_name()
                    )));
                }
                None => unreachable!("schema conformance"),
            };
            match &inner_schema {
                None => {
                    for inner_attr in nested.schema() {
                        if outer.contains(inner_attr) {
                            return Err(Error::Schema(format!(
                                "unnesting {:?} would collide on attribute {:?}",
                                alias, inner_attr
                            )));
                        }
                    }
                    inner_schema = Some(nested.schema().clone());
                }
                Some(seen) if seen != nested.schema() => {
                    return Err(Error::Schema(format!(
                        "cannot unnest {:?}: nested schemas differ across tuples",
                        alias
                    )));
                }
                Some(_) => {}
            }
            let base = tuple.without(&drop);
            for inner in nested.iter() {
                expanded.push(base.merge(inner));
            }
        }

        let mut schema = outer;
        schema.extend(inner_schema.unwrap_or_default());
        Ok(Relation {
            schema,
            tuples: expanded.into_iter().collect(),
        })
    }

    /// Extend (`+`): add computed attributes. The attribute names are known
    /// statically, so the result schema is fixed even for empty input. Each
    /// computation sees the original tuple, not the partially extended one.
    pub fn extend_with(
        &self,
        names: &[String],
        mut compute: impl FnMut(&Tuple) -> Result<Vec<(String, Value)>>,
    ) -> Result<Relation> {
        let mut schema = self.schema.clone();
        for name in names {
            if !schema.insert(name.clone()) {
                return Err(Error::Schema(format!(
                    "extended attribute {:?} collides with an existing attribute",
                    name
                )));
            }
        }
        let mut tuples = BTreeSet::new();
        for tuple in &self.tuples {
            tuples.insert(tuple.extend(compute(tuple)?));
        }
        Ok(Relation { schema, tuples })
    }

    /// Rename (`@`): apply all mappings as one simultaneous substitution,
    /// so swapping two names is legal. Missing sources and colliding targets
    /// are errors.
    pub fn rename(&self, mappings: &[(String, String)]) -> Result<Relation> {
        let mut mapping = BTreeMap::new();
        for (old, new) in mappings {
            if !self.schema.contains(old) {
                return Err(Error::Schema(format!(
                    "cannot rename absent attribute {:?}",
                    old
                )));
            }
            if mapping.insert(old.clone(), new.clone()).is_some() {
                return Err(Error::Schema(format!("attribute {:?} renamed twice", old)));
            }
        }
        let schema: BTreeSet<String> = self
            .schema
            .iter()
            .map(|a| mapping.get(a).unwrap_or(a).clone())
            .collect();
        if schema.len() != self.schema.len() {
            return Err(Error::Schema(
                "rename targets collide with each other or with existing attributes".into(),
            ));
        }
        let tuples = self.tuples.iter().map(|t| t.rename(&mapping)).collect();
        Ok(Relation { schema, tuples })
    }

    fn require_same_schema(&self, other: &Relation, op: &str) -> Result<()> {
        if self.schema != other.schema {
            return Err(Error::Schema(format!(
                "{} requires identical schemas: {:?} vs {:?}",
                op, self.schema, other.schema
            )));
        }
        Ok(())
    }

    /// Union (`|`).
    pub fn union(&self, other: &Relation) -> Result<Relation> {
        self.require_same_schema(other, "union")?;
        Ok(Relation {
            schema: self.schema.clone(),
            tuples: self.tuples.union(&other.tuples).cloned().collect(),
        })
    }

    /// Difference (`-`).
    pub fn difference(&self, other: &Relation) -> Result<Relation> {
        self.require_same_schema(other, "difference")?;
        Ok(Relation {
            schema: self.schema.clone(),
            tuples: self.tuples.difference(&other.tuples).cloned().collect(),
        })
    }

    /// Intersect (`&`).
    pub fn intersect(&self, other: &Relation) -> Result<Relation> {
        self.require_same_schema(other, "intersect")?;
        Ok(Relation {
            schema: self.schema.clone(),
            tuples: self.tuples.intersection(&other.tuples).cloned().collect(),
        })
    }

    /// Partition by the grouping keys. Each group is a relation over the
    /// full input schema; the key tuple carries just the key attributes.
    /// Groups come back in canonical key order.
    pub fn group_by(&self, keys: &[String]) -> Result<Vec<(Tuple, Relation)>> {
        self.check_attrs(keys, "group by")?;
        let key_set: BTreeSet<String> = keys.iter().cloned().collect();
        let mut groups: BTreeMap<Tuple, Relation> = BTreeMap::new();
        for tuple in &self.tuples {
            let key = tuple.project(&key_set);
            groups
                .entry(key)
                .or_insert_with(|| Relation::empty(self.schema.clone()))
                .tuples
                .insert(tuple.clone());
        }
        Ok(groups.into_iter().collect())
    }

    /// Nest by (`/: keys > alias`): like grouping, but instead of collapsing
    /// each group, nest its non-key projection as a relation-valued
    /// attribute. The result is an ordinary relation.
    pub fn nest_by(&self, keys: &[String], alias: &str) -> Result<Relation> {
        let key_set: BTreeSet<String> = keys.iter().cloned().collect();
        if key_set.contains(alias) {
            return Err(Error::Schema(format!(
                "nest attribute {:?} collides with a grouping key",
                alias
            )));
        }
        let inner_schema: BTreeSet<String> =
            self.schema.difference(&key_set).cloned().collect();
        let mut schema = key_set.clone();
        schema.insert(alias.to_owned());

        let mut tuples = BTreeSet::new();
        for (key, group) in self.group_by(keys)? {
            let nested = Relation {
                schema: inner_schema.clone(),
                tuples: group.tuples.iter().map(|t| t.project(&inner_schema)).collect(),
            };
            tuples.insert(key.extend([(alias.to_owned(), Value::Relation(nested))]));
        }
        Ok(Relation { schema, tuples })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tuple) in self.tuples.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tuple)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(pairs: &[(&str, Value)]) -> Tuple {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn names(attrs: &[&str]) -> Vec<String> {
        attrs.iter().map(|a| a.to_string()).collect()
    }

    fn rel(tuples: Vec<Tuple>) -> Relation {
        Relation::infer(tuples).unwrap()
    }

    fn iv(i: i64) -> Value {
        Value::Integer(i)
    }

    #[test]
    fn projection_deduplicates() {
        let r = rel(vec![
            t(&[("id", iv(1)), ("dept", iv(10))]),
            t(&[("id", iv(2)), ("dept", iv(10))]),
        ]);
        let p = r.project(&names(&["dept"])).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.schema().len(), 1);
    }

    #[test]
    fn projecting_an_absent_attribute_errors() {
        let r = rel(vec![t(&[("id", iv(1))])]);
        assert!(matches!(
            r.project(&names(&["missing"])),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn empty_relation_keeps_its_schema_through_project() {
        let r = Relation::empty(["a".to_string(), "b".to_string()].into_iter().collect());
        let p = r.project(&names(&["a"])).unwrap();
        assert!(p.is_empty());
        assert!(p.schema().contains("a"));
    }

    #[test]
    fn natural_join_on_disjoint_schemas_is_a_product() {
        let l = rel(vec![t(&[("a", iv(1))]), t(&[("a", iv(2))])]);
        let r = rel(vec![t(&[("b", iv(3))]), t(&[("b", iv(4))])]);
        assert_eq!(l.natural_join(&r).len(), 4);
    }

    #[test]
    fn nest_join_preserves_unmatched_tuples() {
        let l = rel(vec![t(&[("id", iv(1))]), t(&[("id", iv(2))])]);
        let r = rel(vec![t(&[("id", iv(1)), ("x", iv(9))])]);
        let nested = l.nest_join(&r, "xs").unwrap();
        assert_eq!(nested.len(), 2);
        let unmatched = nested
            .iter()
            .find(|t| t.get("id") == Some(&iv(2)))
            .unwrap();
        match unmatched.get("xs") {
            Some(Value::Relation(inner)) => {
                assert!(inner.is_empty());
                assert!(inner.schema().contains("x"));
            }
            _ => panic!("expected a relation-valued attribute"),
        }
    }

    #[test]
    fn unnest_inverts_nest_join_on_matching_tuples() {
        let l = rel(vec![t(&[("id", iv(1))]), t(&[("id", iv(2))])]);
        let r = rel(vec![
            t(&[("id", iv(1)), ("x", iv(9))]),
            t(&[("id", iv(1)), ("x", iv(8))]),
        ]);
        let roundtrip = l.nest_join(&r, "xs").unwrap().unnest("xs").unwrap();
        assert_eq!(roundtrip, l.natural_join(&r));
    }

    #[test]
    fn unnest_collision_errors() {
        let inner = rel(vec![t(&[("id", iv(7))])]);
        let outer = rel(vec![t(&[("id", iv(1)), ("xs", Value::Relation(inner))])]);
        assert!(matches!(outer.unnest("xs"), Err(Error::Schema(_))));
    }

    #[test]
    fn set_operations_require_identical_schemas() {
        let l = rel(vec![t(&[("a", iv(1))])]);
        let r = rel(vec![t(&[("b", iv(1))])]);
        assert!(matches!(l.union(&r), Err(Error::Schema(_))));
        assert!(matches!(l.difference(&r), Err(Error::Schema(_))));
        assert!(matches!(l.intersect(&r), Err(Error::Schema(_))));
    }

    #[test]
    fn rename_swap_is_simultaneous() {
        let r = rel(vec![t(&[("a", iv(1)), ("b", iv(2))])]);
        let swapped = r
            .rename(&[
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "a".to_string()),
            ])
            .unwrap();
        let only = swapped.iter().next().unwrap();
        assert_eq!(only.get("a"), Some(&iv(2)));
        assert_eq!(only.get("b"), Some(&iv(1)));
    }

    #[test]
    fn rename_target_collision_errors() {
        let r = rel(vec![t(&[("a", iv(1)), ("b", iv(2))])]);
        assert!(matches!(
            r.rename(&[("a".to_string(), "b".to_string())]),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn extend_fixes_schema_even_on_empty_input() {
        let r = Relation::empty(["a".to_string()].into_iter().collect());
        let extended = r
            .extend_with(&names(&["double"]), |_| unreachable!("no tuples"))
            .unwrap();
        assert!(extended.schema().contains("double"));
    }

    #[test]
    fn nest_by_groups_without_collapsing() {
        let r = rel(vec![
            t(&[("dept", iv(10)), ("id", iv(1))]),
            t(&[("dept", iv(10)), ("id", iv(2))]),
            t(&[("dept", iv(20)), ("id", iv(3))]),
        ]);
        let nested = r.nest_by(&names(&["dept"]), "members").unwrap();
        assert_eq!(nested.len(), 2);
        let ten = nested
            .iter()
            .find(|t| t.get("dept") == Some(&iv(10)))
            .unwrap();
        match ten.get("members") {
            Some(Value::Relation(inner)) => assert_eq!(inner.len(), 2),
            _ => panic!("expected a relation-valued attribute"),
        }
    }
}
