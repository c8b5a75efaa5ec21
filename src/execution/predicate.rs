//! Filter predicate compilation and evaluation.
//!
//! A condition is compiled once per filter, not once per tuple: constant
//! right-hand sides are pre-evaluated, set literals become hash sets for
//! O(1) membership, and membership subqueries run exactly once against the
//! environment. Predicates are two-valued; there are no unknowns.

use crate::error::{Error, Result};
use crate::execution::executor::Executor;
use crate::parsing::ast::{AggregateCall, AttrPath, CompareOp, Condition, Expr};
use crate::types::{Tuple, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A condition with its right-hand sides resolved.
pub(crate) enum CompiledCondition {
    Compare {
        left: Operand,
        op: CompareOp,
        rhs: CompiledRhs,
    },
    And(Box<CompiledCondition>, Box<CompiledCondition>),
    Or(Box<CompiledCondition>, Box<CompiledCondition>),
}

/// The left side of a comparison: an attribute of the tuple under test, or
/// an aggregate over one of its relation-valued attributes.
pub(crate) enum Operand {
    Attribute(AttrPath),
    Aggregate(AggregateCall),
}

pub(crate) enum CompiledRhs {
    Constant(Value),
    /// `{a, b, c}` membership.
    Set(HashSet<Value>),
    /// Subquery membership: the projected values of a one-attribute result.
    Membership(HashSet<Value>),
    /// Another attribute of the same tuple.
    Attribute(AttrPath),
}

impl Executor<'_> {
    pub(crate) fn compile_condition(&self, condition: &Condition) -> Result<CompiledCondition> {
        match condition {
            Condition::And(left, right) => Ok(CompiledCondition::And(
                Box::new(self.compile_condition(left)?),
                Box::new(self.compile_condition(right)?),
            )),
            Condition::Or(left, right) => Ok(CompiledCondition::Or(
                Box::new(self.compile_condition(left)?),
                Box::new(self.compile_condition(right)?),
            )),
            Condition::Compare { left, op, right } => {
                let left = match left {
                    Expr::Attribute(path) => Operand::Attribute(path.clone()),
                    Expr::Aggregate(call) => Operand::Aggregate(call.clone()),
                    other => {
                        return Err(Error::Type(format!(
                            "unsupported comparison left-hand side: {:?}",
                            other
                        )));
                    }
                };
                let rhs = self.compile_rhs(right)?;
                Ok(CompiledCondition::Compare {
                    left,
                    op: *op,
                    rhs,
                })
            }
        }
    }

    fn compile_rhs(&self, right: &Expr) -> Result<CompiledRhs> {
        match right {
            Expr::Integer(i) => Ok(CompiledRhs::Constant(Value::Integer(*i))),
            Expr::Decimal(d) => Ok(CompiledRhs::Constant(Value::Decimal(*d))),
            Expr::Str(s) => Ok(CompiledRhs::Constant(Value::Str(s.clone()))),
            Expr::Boolean(b) => Ok(CompiledRhs::Constant(Value::Boolean(*b))),
            Expr::Attribute(path) => Ok(CompiledRhs::Attribute(path.clone())),
            Expr::Set(elements) => {
                let mut set = HashSet::new();
                for element in elements {
                    match element {
                        Expr::Integer(i) => set.insert(Value::Integer(*i)),
                        Expr::Decimal(d) => set.insert(Value::Decimal(*d)),
                        Expr::Str(s) => set.insert(Value::Str(s.clone())),
                        Expr::Boolean(b) => set.insert(Value::Boolean(*b)),
                        _ => {
                            return Err(Error::Type(
                                "set literal elements must be constants".into(),
                            ));
                        }
                    };
                }
                Ok(CompiledRhs::Set(set))
            }
            Expr::Subquery(query) => {
                let rel = self
                    .eval_rel(query)?
                    .into_relation("a membership subquery")?;
                if rel.schema().len() != 1 {
                    return Err(Error::Schema(format!(
                        "a membership subquery must produce a single attribute, got {}",
                        rel.schema().len()
                    )));
                }
                let attr = rel.schema().iter().next().cloned().unwrap_or_default();
                let values = rel
                    .iter()
                    .filter_map(|t| t.get(&attr).cloned())
                    .collect::<HashSet<Value>>();
                Ok(CompiledRhs::Membership(values))
            }
            other => Err(Error::Type(format!(
                "unsupported comparison right-hand side: {:?}",
                other
            ))),
        }
    }

    /// Does the tuple satisfy the compiled condition?
    pub(crate) fn condition_matches(
        &self,
        condition: &CompiledCondition,
        tuple: &Tuple,
    ) -> Result<bool> {
        match condition {
            CompiledCondition::And(left, right) => Ok(self.condition_matches(left, tuple)?
                && self.condition_matches(right, tuple)?),
            CompiledCondition::Or(left, right) => Ok(self.condition_matches(left, tuple)?
                || self.condition_matches(right, tuple)?),
            CompiledCondition::Compare { left, op, rhs } => {
                let value = match left {
                    Operand::Attribute(path) => tuple_attr(tuple, path)?,
                    Operand::Aggregate(call) => self.eval_aggregate_call(call, tuple)?,
                };
                match rhs {
                    CompiledRhs::Constant(constant) => compare(&value, *op, constant),
                    CompiledRhs::Attribute(path) => {
                        let other = tuple_attr(tuple, path)?;
                        compare(&value, *op, &other)
                    }
                    CompiledRhs::Set(set) | CompiledRhs::Membership(set) => match op {
                        CompareOp::Equal => Ok(set.contains(&value)),
                        CompareOp::NotEqual => Ok(!set.contains(&value)),
                        _ => Err(Error::Type(format!(
                            "cannot use '{}' with a set; only '=' and '!=' test membership",
                            op
                        ))),
                    },
                }
            }
        }
    }
}

/// Filter operands resolve against the tuple only; the environment plays no
/// part inside a predicate.
fn tuple_attr(tuple: &Tuple, path: &AttrPath) -> Result<Value> {
    let first = &path.0[0];
    let value = tuple
        .get(first)
        .ok_or_else(|| Error::UnknownAttribute(first.clone()))?;
    if path.0.len() > 1 {
        return Err(Error::Type(format!(
            "cannot reach into {:?} with '.' outside an aggregate",
            first
        )));
    }
    Ok(value.clone())
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool> {
    let ordering = left.compare(right)?;
    Ok(match op {
        CompareOp::Equal => ordering == Ordering::Equal,
        CompareOp::NotEqual => ordering != Ordering::Equal,
        CompareOp::LessThan => ordering == Ordering::Less,
        CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
        CompareOp::GreaterThan => ordering == Ordering::Greater,
        CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
    })
}
