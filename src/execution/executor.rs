//! Tree-walking evaluator for relational expressions.
//!
//! Each node evaluates its children and applies one operator. Every step is
//! either a relation or ordered tuples; the `rel` helper enforces the type
//! boundary by rejecting ordered input to relational operators.

use crate::error::{Error, Result};
use crate::execution::aggregate;
use crate::execution::environment::Environment;
use crate::parsing::ast::{NamedAggregate, RelExpr, SortKey};
use crate::types::{Output, OrderedTuples, Relation, Tuple};
use std::collections::BTreeSet;

pub struct Executor<'a> {
    env: &'a Environment,
}

impl<'a> Executor<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Executor { env }
    }

    pub(crate) fn env(&self) -> &Environment {
        self.env
    }

    /// Evaluate a relational expression to its result.
    pub fn execute(&self, expr: &RelExpr) -> Result<Output> {
        self.eval_rel(expr)
    }

    /// Evaluate a node expecting a relation; ordered input is a boundary
    /// violation named after the consuming operator.
    fn rel(&self, expr: &RelExpr, context: &str) -> Result<Relation> {
        self.eval_rel(expr)?.into_relation(context)
    }

    pub(crate) fn eval_rel(&self, expr: &RelExpr) -> Result<Output> {
        match expr {
            RelExpr::Name(name) => Ok(self.env.lookup(name)?.clone().into()),

            RelExpr::Filter {
                source,
                condition,
                negated,
            } => {
                let source = self.rel(source, "filter")?;
                let compiled = self.compile_condition(condition)?;
                let result = source.filter(|tuple| {
                    let matched = self.condition_matches(&compiled, tuple)?;
                    Ok(matched != *negated)
                })?;
                Ok(result.into())
            }

            RelExpr::Project { source, attrs } => {
                Ok(self.rel(source, "project")?.project(attrs)?.into())
            }

            RelExpr::Remove { source, attrs } => {
                Ok(self.rel(source, "remove")?.remove(attrs)?.into())
            }

            RelExpr::Join { left, right } => {
                let left = self.rel(left, "join")?;
                let right = self.rel(right, "join")?;
                Ok(left.natural_join(&right).into())
            }

            RelExpr::NestJoin { left, right, alias } => {
                let left = self.rel(left, "nest join")?;
                let right = self.rel(right, "nest join")?;
                Ok(left.nest_join(&right, alias)?.into())
            }

            RelExpr::Unnest { source, alias } => {
                Ok(self.rel(source, "unnest")?.unnest(alias)?.into())
            }

            RelExpr::Extend {
                source,
                computations,
            } => {
                let source = self.rel(source, "extend")?;
                let names = distinct_names(
                    computations.iter().map(|(name, _)| name),
                    "computed attribute",
                )?;
                let result = source.extend_with(&names, |tuple| {
                    computations
                        .iter()
                        .map(|(name, expr)| Ok((name.clone(), self.eval_expr(expr, tuple)?)))
                        .collect()
                })?;
                Ok(result.into())
            }

            RelExpr::Rename { source, mappings } => {
                Ok(self.rel(source, "rename")?.rename(mappings)?.into())
            }

            RelExpr::Union { left, right } => {
                let left = self.rel(left, "union")?;
                let right = self.rel(right, "union")?;
                Ok(left.union(&right)?.into())
            }

            RelExpr::Difference { left, right } => {
                let left = self.rel(left, "difference")?;
                let right = self.rel(right, "difference")?;
                Ok(left.difference(&right)?.into())
            }

            RelExpr::Intersect { left, right } => {
                let left = self.rel(left, "intersect")?;
                let right = self.rel(right, "intersect")?;
                Ok(left.intersect(&right)?.into())
            }

            RelExpr::Summarize {
                source,
                keys,
                aggregates,
            } => {
                let source = self.rel(source, "summarize")?;
                self.summarize(&source, keys, aggregates)
            }

            RelExpr::SummarizeAll { source, aggregates } => {
                let source = self.rel(source, "summarize")?;
                self.summarize_all(&source, aggregates)
            }

            RelExpr::NestBy {
                source,
                keys,
                alias,
            } => Ok(self.rel(source, "nest by")?.nest_by(keys, alias)?.into()),

            RelExpr::Sort { source, keys } => {
                let source = self.rel(source, "sort")?;
                Ok(sort(&source, keys)?.into())
            }

            RelExpr::Take { source, count } => match self.eval_rel(source)? {
                Output::Ordered(tuples) => Ok(tuples.take(*count).into()),
                Output::Relation(_) => Err(Error::Boundary(
                    "'^' requires ordered tuples; sort with '$' first".into(),
                )),
            },
        }
    }

    /// Grouped summarize: one output tuple per distinct key, carrying the
    /// key attributes plus the named aggregates. Empty input means no
    /// groups, so the result is empty.
    fn summarize(
        &self,
        source: &Relation,
        keys: &[String],
        aggregates: &[NamedAggregate],
    ) -> Result<Output> {
        let agg_names = validate_aggregate_names(keys, aggregates)?;
        let mut schema: BTreeSet<String> = keys.iter().cloned().collect();
        schema.extend(agg_names);

        let mut tuples = Vec::new();
        for (key, group) in source.group_by(keys)? {
            let computed = aggregates
                .iter()
                .map(|agg| {
                    Ok((
                        agg.name.clone(),
                        aggregate::apply(agg.call.func, &group, agg.call.attr.as_deref())?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            tuples.push(key.extend(computed));
        }
        Ok(Relation::from_tuples(schema, tuples)?.into())
    }

    /// Summarize-all: one output tuple over the entire input, empty or not.
    fn summarize_all(&self, source: &Relation, aggregates: &[NamedAggregate]) -> Result<Output> {
        let agg_names = validate_aggregate_names(&[], aggregates)?;
        let schema: BTreeSet<String> = agg_names.into_iter().collect();
        let computed = aggregates
            .iter()
            .map(|agg| {
                Ok((
                    agg.name.clone(),
                    aggregate::apply(agg.call.func, source, agg.call.attr.as_deref())?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let tuple: Tuple = computed.into_iter().collect();
        Ok(Relation::from_tuples(schema, [tuple])?.into())
    }
}

/// Aggregate names must be distinct and must not shadow a grouping key.
/// Aggregate sources (`#. (team ? ...)`, `>. team.salary`) need a tuple
/// context and belong in extend, not here.
fn validate_aggregate_names(keys: &[String], aggregates: &[NamedAggregate]) -> Result<Vec<String>> {
    for agg in aggregates {
        if agg.call.source.is_some() {
            return Err(Error::Type(format!(
                "aggregate '{}' cannot take a source in summarize; nest with '/:' and extend instead",
                agg.name
            )));
        }
        if keys.contains(&agg.name) {
            return Err(Error::Schema(format!(
                "aggregate name {:?} collides with a grouping key",
                agg.name
            )));
        }
    }
    distinct_names(aggregates.iter().map(|a| &a.name), "aggregate")
}

fn distinct_names<'n>(
    names: impl Iterator<Item = &'n String>,
    what: &str,
) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(Error::Schema(format!("duplicate {} name {:?}", what, name)));
        }
        out.push(name.clone());
    }
    Ok(out)
}

/// Sort tuples by the keys, lexicographically, ascending unless suffixed
/// with `-`. Every key column must hold a single domain; the sort itself is
/// stable over the relation's canonical order, so ties are deterministic.
fn sort(source: &Relation, keys: &[SortKey]) -> Result<OrderedTuples> {
    for key in keys {
        if !source.schema().contains(&key.attr) {
            return Err(Error::UnknownAttribute(key.attr.clone()));
        }
        let mut domain = None;
        for tuple in source.iter() {
            let value = tuple.get(&key.attr).expect("schema conformance");
            match domain {
                None => domain = Some(value.domain()),
                Some(seen) if seen != value.domain() => {
                    return Err(Error::Type(format!(
                        "sort key {:?} mixes {} and {} values",
                        key.attr,
                        seen,
                        value.domain()
                    )));
                }
                Some(_) => {}
            }
        }
    }

    let mut tuples: Vec<Tuple> = source.iter().cloned().collect();
    tuples.sort_by(|a, b| {
        for key in keys {
            let left = a.get(&key.attr).expect("schema conformance");
            let right = b.get(&key.attr).expect("schema conformance");
            let ordering = left.cmp(right);
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
    Ok(OrderedTuples::new(tuples))
}
