//! AST node definitions.
//!
//! Two closed node families: scalar/predicate expressions, which evaluate to
//! a value or a truth against a tuple context, and relational expressions,
//! which evaluate to a relation (or, after sort, to ordered tuples).

use rust_decimal::Decimal;
use std::fmt;

/// An attribute reference, optionally dotted to reach into a
/// relation-valued attribute: `salary` or `team.salary`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttrPath(pub Vec<String>);

impl AttrPath {
    pub fn single(name: impl Into<String>) -> Self {
        AttrPath(vec![name.into()])
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

/// The five aggregate operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AggregateFunc {
    Count, // #.
    Sum,   // +.
    Max,   // >.
    Min,   // <.
    Mean,  // %.
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateFunc::Count => "#.",
            AggregateFunc::Sum => "+.",
            AggregateFunc::Max => ">.",
            AggregateFunc::Min => "<.",
            AggregateFunc::Mean => "%.",
        };
        write!(f, "{}", s)
    }
}

/// An aggregate application. `attr` names the attribute to fold over (absent
/// for count). `source`, when present, provides the relation: a bare name
/// resolved against the tuple context first (`#. phones`), a dotted path
/// (`>. team.salary`), or a parenthesized chain (`#. (team ? ...)`).
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateCall {
    pub func: AggregateFunc,
    pub attr: Option<String>,
    pub source: Option<Box<RelExpr>>,
}

/// Scalar expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Integer(i64),
    Decimal(Decimal),
    Str(String),
    Boolean(bool),
    Attribute(AttrPath),
    /// `{v1, v2, ...}` — membership right-hand side of `=` in a filter.
    Set(Vec<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `? cond then else` — extend-only conditional.
    Ternary {
        condition: Box<Condition>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Aggregate(AggregateCall),
    /// `name(arg, ...)` — built-in function call.
    Call { name: String, args: Vec<Expr> },
    /// A parenthesized chain used as the right-hand side of `=` in a filter.
    Subquery(Box<RelExpr>),
}

/// Filter predicates: comparisons combined with `&` and `|`.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

/// A sort key: `attr` ascending, `attr-` descending.
#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub attr: String,
    pub descending: bool,
}

/// A named aggregate inside summarize: `n: #.` or `total: +. salary`.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedAggregate {
    pub name: String,
    pub call: AggregateCall,
}

/// Relational expressions. Each postfix operator wraps the chain so far as
/// its source, so `E ? p # a $ k` nests left to right.
#[derive(Clone, Debug, PartialEq)]
pub enum RelExpr {
    /// A named relation, looked up in the environment.
    Name(String),
    /// `? cond` keeps matching tuples; `?! cond` keeps the rest.
    Filter {
        source: Box<RelExpr>,
        condition: Condition,
        negated: bool,
    },
    /// `# attrs`
    Project {
        source: Box<RelExpr>,
        attrs: Vec<String>,
    },
    /// `#! attrs`
    Remove {
        source: Box<RelExpr>,
        attrs: Vec<String>,
    },
    /// `* R`
    Join {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
    },
    /// `*: R > alias`
    NestJoin {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
        alias: String,
    },
    /// `<: alias`
    Unnest {
        source: Box<RelExpr>,
        alias: String,
    },
    /// `+ [name: expr ...]`
    Extend {
        source: Box<RelExpr>,
        computations: Vec<(String, Expr)>,
    },
    /// `@ [old > new ...]`
    Rename {
        source: Box<RelExpr>,
        mappings: Vec<(String, String)>,
    },
    /// `| R`
    Union {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
    },
    /// `- R`
    Difference {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
    },
    /// `& R`
    Intersect {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
    },
    /// `/ keys [aggs]`
    Summarize {
        source: Box<RelExpr>,
        keys: Vec<String>,
        aggregates: Vec<NamedAggregate>,
    },
    /// `/. [aggs]`
    SummarizeAll {
        source: Box<RelExpr>,
        aggregates: Vec<NamedAggregate>,
    },
    /// `/: keys > alias`
    NestBy {
        source: Box<RelExpr>,
        keys: Vec<String>,
        alias: String,
    },
    /// `$ keys` — leaves the relational world.
    Sort {
        source: Box<RelExpr>,
        keys: Vec<SortKey>,
    },
    /// `^ N` — first N of an ordered input.
    Take {
        source: Box<RelExpr>,
        count: usize,
    },
}
