//! Scalar and relation values.
//!
//! The value space is a tagged union of five cases: 64-bit integers,
//! arbitrary-precision decimals, booleans, strings, and relations. The
//! relation case is what makes the space non-regular and enables
//! relation-valued attributes.
//!
//! Two comparison layers coexist:
//!
//! - [`Ord`] is a *total* order used for canonical storage (tuples live in
//!   ordered sets) and for deterministic iteration. Integers and decimals
//!   compare numerically; unrelated domains order by an internal rank.
//! - [`Value::compare`] is the *user-facing* comparison used by filters and
//!   sort keys. It errors on mixed domains instead of inventing an answer.

use crate::error::{Error, Result};
use crate::types::relation::Relation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Str(String),
    Relation(Relation),
}

impl Value {
    /// Human-readable name of the value's domain, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Relation(_) => "relation",
        }
    }

    /// Comparison domain: integers and decimals share the numeric domain.
    pub fn domain(&self) -> &'static str {
        match self {
            Value::Integer(_) | Value::Decimal(_) => "numeric",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Relation(_) => "relation",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    /// Widen a numeric value to a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Integer(_) | Value::Decimal(_) => 0,
            Value::Boolean(_) => 1,
            Value::Str(_) => 2,
            Value::Relation(_) => 3,
        }
    }

    fn decimal_pair(&self, other: &Value, op: &str) -> Result<(Decimal, Decimal)> {
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(Error::Type(format!(
                "cannot apply {} to {} and {}",
                op,
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value> {
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            return a
                .checked_add(*b)
                .map(Value::Integer)
                .ok_or_else(|| Error::Domain("integer overflow in +".into()));
        }
        let (a, b) = self.decimal_pair(other, "+")?;
        a.checked_add(b)
            .map(Value::Decimal)
            .ok_or_else(|| Error::Domain("decimal overflow in +".into()))
    }

    pub fn subtract(&self, other: &Value) -> Result<Value> {
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            return a
                .checked_sub(*b)
                .map(Value::Integer)
                .ok_or_else(|| Error::Domain("integer overflow in -".into()));
        }
        let (a, b) = self.decimal_pair(other, "-")?;
        a.checked_sub(b)
            .map(Value::Decimal)
            .ok_or_else(|| Error::Domain("decimal overflow in -".into()))
    }

    pub fn multiply(&self, other: &Value) -> Result<Value> {
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            return a
                .checked_mul(*b)
                .map(Value::Integer)
                .ok_or_else(|| Error::Domain("integer overflow in *".into()));
        }
        let (a, b) = self.decimal_pair(other, "*")?;
        a.checked_mul(b)
            .map(Value::Decimal)
            .ok_or_else(|| Error::Domain("decimal overflow in *".into()))
    }

    /// Division. Integer inputs use floor division; anything involving a
    /// decimal divides exactly in the decimal domain.
    pub fn divide(&self, other: &Value) -> Result<Value> {
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            if *b == 0 {
                return Err(Error::Domain("division by zero".into()));
            }
            return a
                .checked_div_euclid(*b)
                .map(Value::Integer)
                .ok_or_else(|| Error::Domain("integer overflow in /".into()));
        }
        let (a, b) = self.decimal_pair(other, "/")?;
        if b.is_zero() {
            return Err(Error::Domain("division by zero".into()));
        }
        a.checked_div(b)
            .map(Value::Decimal)
            .ok_or_else(|| Error::Domain("decimal overflow in /".into()))
    }

    /// Strict comparison: values must share a domain. Integers and decimals
    /// compare numerically; all other mixes are type errors.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        if self.domain() == other.domain() {
            Ok(self.cmp(other))
        } else {
            Err(Error::Type(format!(
                "cannot compare {} with {}",
                self.type_name(),
                other.type_name()
            )))
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.cmp(b),
            (Integer(a), Decimal(b)) => rust_decimal::Decimal::from(*a).cmp(b),
            (Decimal(a), Integer(b)) => a.cmp(&rust_decimal::Decimal::from(*b)),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Relation(a), Relation(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

// Hash must agree with Eq: Integer(1) and Decimal(1.0) are equal, so both
// hash through the decimal representation. rust_decimal's Hash already
// normalizes trailing zeros.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Integer(i) => Decimal::from(*i).hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Relation(r) => r.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Relation(r) => write!(f, "{}", r),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Relation> for Value {
    fn from(r: Relation) -> Self {
        Value::Relation(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn integer_decimal_equality_and_hash() {
        let i = Value::Integer(10);
        let d = Value::Decimal(Decimal::from_str("10.0").unwrap());
        assert_eq!(i, d);

        let mut set = std::collections::HashSet::new();
        set.insert(i);
        assert!(set.contains(&d));
    }

    #[test]
    fn integer_division_floors() {
        let v = Value::Integer(7).divide(&Value::Integer(2)).unwrap();
        assert_eq!(v, Value::Integer(3));
        let v = Value::Integer(-7).divide(&Value::Integer(2)).unwrap();
        assert_eq!(v, Value::Integer(-4));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_decimal() {
        let d = Decimal::from_str("2.5").unwrap();
        let v = Value::Integer(2).multiply(&Value::Decimal(d)).unwrap();
        assert_eq!(v, Value::Decimal(Decimal::from_str("5.0").unwrap()));
    }

    #[test]
    fn division_by_zero_is_a_domain_error() {
        let err = Value::Integer(1).divide(&Value::Integer(0)).unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
    }

    #[test]
    fn overflow_is_a_domain_error() {
        let err = Value::Integer(i64::MAX)
            .add(&Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
    }

    #[test]
    fn cross_domain_comparison_errors() {
        let err = Value::Str("a".into())
            .compare(&Value::Integer(1))
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn arithmetic_on_strings_errors() {
        let err = Value::Str("a".into()).add(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }
}
