//! The data model: values, tuples, relations, and the ordered escape hatch.

mod relation;
mod tuple;
mod value;

pub use relation::Relation;
pub use tuple::Tuple;
pub use value::Value;

use crate::error::{Error, Result};

/// A finite, ordered sequence of tuples.
///
/// Produced only by sort (`$`), consumed only by take (`^`). This is a
/// different kind of value from [`Relation`]: no relational operator accepts
/// it. Rows keep their order; attributes within a row stay unordered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderedTuples(Vec<Tuple>);

impl OrderedTuples {
    pub fn new(tuples: Vec<Tuple>) -> Self {
        OrderedTuples(tuples)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.0.iter()
    }

    /// The first `count` tuples, in order.
    pub fn take(&self, count: usize) -> OrderedTuples {
        OrderedTuples(self.0.iter().take(count).cloned().collect())
    }
}

/// What a query evaluates to: a relation, or ordered tuples after a sort.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    Relation(Relation),
    Ordered(OrderedTuples),
}

impl Output {
    /// Unwrap a relation, or report the boundary violation. `context` names
    /// the operation that needed a relation.
    pub fn into_relation(self, context: &str) -> Result<Relation> {
        match self {
            Output::Relation(rel) => Ok(rel),
            Output::Ordered(_) => Err(Error::Boundary(format!(
                "{} requires a relation, but its input is ordered tuples (sort must come last)",
                context
            ))),
        }
    }
}

impl From<Relation> for Output {
    fn from(rel: Relation) -> Self {
        Output::Relation(rel)
    }
}

impl From<OrderedTuples> for Output {
    fn from(tuples: OrderedTuples) -> Self {
        Output::Ordered(tuples)
    }
}
