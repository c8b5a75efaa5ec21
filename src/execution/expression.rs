//! Scalar expression evaluation in tuple context.
//!
//! Attribute references resolve against the current tuple first and the
//! environment second. That two-level scope is what makes
//! `E /: dept_id > team + [top: >. team.salary]` meaningful: `team` is a
//! relation-valued attribute of the tuple, not a bound relation.

use crate::error::{Error, Result};
use crate::execution::aggregate;
use crate::execution::executor::Executor;
use crate::functions::FunctionRegistry;
use crate::parsing::ast::{AggregateCall, AttrPath, BinaryOp, Expr, RelExpr};
use crate::types::{Relation, Tuple, Value};

impl Executor<'_> {
    /// Evaluate a scalar expression against a tuple.
    pub(crate) fn eval_expr(&self, expr: &Expr, tuple: &Tuple) -> Result<Value> {
        match expr {
            Expr::Integer(i) => Ok(Value::Integer(*i)),
            Expr::Decimal(d) => Ok(Value::Decimal(*d)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Attribute(path) => self.eval_attr_path(path, tuple),
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, tuple)?;
                let right = self.eval_expr(right, tuple)?;
                match op {
                    BinaryOp::Add => left.add(&right),
                    BinaryOp::Subtract => left.subtract(&right),
                    BinaryOp::Multiply => left.multiply(&right),
                    BinaryOp::Divide => left.divide(&right),
                }
            }
            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                let compiled = self.compile_condition(condition)?;
                if self.condition_matches(&compiled, tuple)? {
                    self.eval_expr(if_true, tuple)
                } else {
                    self.eval_expr(if_false, tuple)
                }
            }
            Expr::Aggregate(call) => self.eval_aggregate_call(call, tuple),
            Expr::Call { name, args } => {
                let function = FunctionRegistry::global()
                    .lookup(name)
                    .ok_or_else(|| Error::UnknownFunction(name.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, tuple))
                    .collect::<Result<Vec<_>>>()?;
                function.call(&args)
            }
            Expr::Subquery(query) => {
                let rel = self.eval_rel(query)?.into_relation("a subquery")?;
                Ok(Value::Relation(rel))
            }
            Expr::Set(_) => Err(Error::Type(
                "a set literal is only valid as a comparison right-hand side".into(),
            )),
        }
    }

    /// Tuple first, environment second. A dotted path is only meaningful
    /// inside an aggregate, where the relation-valued attribute becomes the
    /// aggregation source; here it is an error.
    fn eval_attr_path(&self, path: &AttrPath, tuple: &Tuple) -> Result<Value> {
        let first = &path.0[0];
        let value = match tuple.get(first) {
            Some(value) => value.clone(),
            None => match self.env().lookup(first) {
                Ok(rel) => Value::Relation(rel.clone()),
                Err(_) => return Err(Error::UnknownAttribute(first.clone())),
            },
        };
        if path.0.len() > 1 {
            return Err(Error::Type(format!(
                "cannot reach into {:?} with '.' outside an aggregate",
                first
            )));
        }
        Ok(value)
    }

    /// Evaluate an aggregate call in tuple context. The source relation is
    /// resolved tuple-first, so `#. phones` counts the tuple's nested
    /// relation and `>. team.salary` folds inside it.
    pub(crate) fn eval_aggregate_call(&self, call: &AggregateCall, tuple: &Tuple) -> Result<Value> {
        let source = match &call.source {
            Some(rel_expr) => self.eval_rel_in_tuple_context(rel_expr, tuple)?,
            None => {
                return Err(Error::Type(format!(
                    "aggregate '{}' needs a relation source here",
                    call.func
                )));
            }
        };
        aggregate::apply(call.func, &source, call.attr.as_deref())
    }

    /// Evaluate a relational expression where a bare name may refer to a
    /// relation-valued attribute of the current tuple. Filter and project
    /// recurse so that `#. (team ? role = "engineer")` works; everything
    /// else falls back to ordinary evaluation.
    fn eval_rel_in_tuple_context(&self, expr: &RelExpr, tuple: &Tuple) -> Result<Relation> {
        match expr {
            RelExpr::Name(name) => match tuple.get(name) {
                Some(Value::Relation(rel)) => Ok(rel.clone()),
                Some(other) => Err(Error::Type(format!(
                    "{:?} is not a relation-valued attribute (found a {})",
                    name,
                    other.type_name()
                ))),
                None => Ok(self.env().lookup(name)?.clone()),
            },
            RelExpr::Filter {
                source,
                condition,
                negated,
            } => {
                let source = self.eval_rel_in_tuple_context(source, tuple)?;
                let compiled = self.compile_condition(condition)?;
                source.filter(|t| {
                    let matched = self.condition_matches(&compiled, t)?;
                    Ok(matched != *negated)
                })
            }
            RelExpr::Project { source, attrs } => {
                let source = self.eval_rel_in_tuple_context(source, tuple)?;
                source.project(attrs)
            }
            _ => self.eval_rel(expr)?.into_relation("an aggregate source"),
        }
    }
}
