//! An interpreter for a terse, symbolic relational algebra.
//!
//! Queries are chains of postfix operators applied left to right:
//!
//! ```text
//! E ? salary > 50000 # [name salary] $ salary- ^ 3
//! ```
//!
//! filters employees, projects two attributes, sorts descending by salary,
//! and takes the top three. The pipeline has three stages with value-only
//! interfaces:
//!
//! ```text
//! source text -> Lexer -> tokens -> Parser -> AST -> Executor -> Output
//! ```
//!
//! where [`Output`] is either a [`Relation`] (an unordered, duplicate-free
//! set of tuples with a known attribute set) or [`OrderedTuples`] (the
//! ordered sequence a sort produces). Relations are closed under every
//! operator; sort is the single, explicit exit from the relational world.
//!
//! The host populates an [`Environment`] with named relations and calls
//! [`compile_and_eval`]. Everything else — the REPL, file loading, table
//! rendering — lives outside the core pipeline.

pub mod data;
pub mod error;
pub mod execution;
pub mod functions;
pub mod parsing;
pub mod render;
pub mod types;

pub use error::{Error, Result};
pub use execution::{Environment, Executor};
pub use types::{Output, OrderedTuples, Relation, Tuple, Value};

use parsing::ast::RelExpr;

/// Parse source text into an AST. Purely syntactic.
pub fn parse(source: &str) -> Result<RelExpr> {
    parsing::parse(source)
}

/// Evaluate a parsed expression against an environment. Purely semantic.
pub fn evaluate(expr: &RelExpr, env: &Environment) -> Result<Output> {
    Executor::new(env).execute(expr)
}

/// Parse and evaluate in one step.
pub fn compile_and_eval(source: &str, env: &Environment) -> Result<Output> {
    evaluate(&parse(source)?, env)
}
