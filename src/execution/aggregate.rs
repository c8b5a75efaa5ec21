//! The five aggregate operators, applied to a relation.
//!
//! Empty-input policy: count, sum, and mean of an empty relation are 0 (the
//! integer zero); min and max of an empty relation are domain errors. The
//! same policy holds whether the relation is a summarize group, the whole
//! input of `/.`, or a relation-valued attribute.

use crate::error::{Error, Result};
use crate::parsing::ast::AggregateFunc;
use crate::types::{Relation, Value};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Apply an aggregate to a relation, folding `attr` where one is required.
pub fn apply(func: AggregateFunc, rel: &Relation, attr: Option<&str>) -> Result<Value> {
    match func {
        AggregateFunc::Count => Ok(Value::Integer(rel.len() as i64)),
        AggregateFunc::Sum => sum(&column(rel, required(func, attr)?)?),
        AggregateFunc::Max => extreme(func, &column(rel, required(func, attr)?)?, Ordering::Greater),
        AggregateFunc::Min => extreme(func, &column(rel, required(func, attr)?)?, Ordering::Less),
        AggregateFunc::Mean => mean(&column(rel, required(func, attr)?)?),
    }
}

fn required(func: AggregateFunc, attr: Option<&str>) -> Result<&str> {
    attr.ok_or_else(|| Error::Type(format!("aggregate '{}' requires an attribute", func)))
}

fn column<'a>(rel: &'a Relation, attr: &str) -> Result<Vec<&'a Value>> {
    rel.iter()
        .map(|tuple| {
            tuple
                .get(attr)
                .ok_or_else(|| Error::UnknownAttribute(attr.to_owned()))
        })
        .collect()
}

/// Integer-only sums stay integers; one decimal promotes the whole fold.
fn sum(values: &[&Value]) -> Result<Value> {
    let mut acc = Value::Integer(0);
    for value in values {
        if !value.is_numeric() {
            return Err(Error::Type(format!(
                "cannot sum a {} attribute",
                value.type_name()
            )));
        }
        acc = acc.add(value)?;
    }
    Ok(acc)
}

fn extreme(func: AggregateFunc, values: &[&Value], keep: Ordering) -> Result<Value> {
    let mut iter = values.iter();
    let Some(first) = iter.next() else {
        return Err(Error::Domain(format!(
            "'{}' over an empty relation",
            func
        )));
    };
    let mut best: &Value = *first;
    for value in iter {
        if value.compare(best)? == keep {
            best = *value;
        }
    }
    Ok(best.clone())
}

/// Integer inputs use floor division; any decimal input promotes the whole
/// computation to the decimal domain.
fn mean(values: &[&Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Integer(0));
    }
    let total = sum(values)?;
    let count = values.len() as i64;
    match total {
        Value::Integer(t) => Ok(Value::Integer(t.div_euclid(count))),
        Value::Decimal(t) => t
            .checked_div(Decimal::from(count))
            .map(Value::Decimal)
            .ok_or_else(|| Error::Domain("decimal overflow in mean".into())),
        _ => unreachable!("sum of numerics is numeric"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tuple;
    use std::str::FromStr;

    fn salaries(values: &[i64]) -> Relation {
        Relation::infer(values.iter().map(|v| {
            [("salary".to_string(), Value::Integer(*v))]
                .into_iter()
                .collect::<Tuple>()
        }))
        .unwrap()
    }

    #[test]
    fn count_counts_tuples() {
        let rel = salaries(&[1, 2, 3]);
        assert_eq!(
            apply(AggregateFunc::Count, &rel, None).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn sum_and_mean_on_integers() {
        let rel = salaries(&[80000, 60000, 90000]);
        assert_eq!(
            apply(AggregateFunc::Sum, &rel, Some("salary")).unwrap(),
            Value::Integer(230000)
        );
        // Floor division: 230000 / 3 = 76666.
        assert_eq!(
            apply(AggregateFunc::Mean, &rel, Some("salary")).unwrap(),
            Value::Integer(76666)
        );
    }

    #[test]
    fn mean_with_decimals_promotes() {
        let rel = Relation::infer([
            [(
                "x".to_string(),
                Value::Decimal(Decimal::from_str("1.5").unwrap()),
            )]
            .into_iter()
            .collect::<Tuple>(),
            [("x".to_string(), Value::Integer(2))]
                .into_iter()
                .collect::<Tuple>(),
        ])
        .unwrap();
        assert_eq!(
            apply(AggregateFunc::Mean, &rel, Some("x")).unwrap(),
            Value::Decimal(Decimal::from_str("1.75").unwrap())
        );
    }

    #[test]
    fn min_max_follow_value_order() {
        let rel = salaries(&[55000, 90000, 45000]);
        assert_eq!(
            apply(AggregateFunc::Max, &rel, Some("salary")).unwrap(),
            Value::Integer(90000)
        );
        assert_eq!(
            apply(AggregateFunc::Min, &rel, Some("salary")).unwrap(),
            Value::Integer(45000)
        );
    }

    #[test]
    fn empty_input_policy() {
        let empty = Relation::empty(["salary".to_string()].into_iter().collect());
        assert_eq!(
            apply(AggregateFunc::Count, &empty, None).unwrap(),
            Value::Integer(0)
        );
        assert_eq!(
            apply(AggregateFunc::Sum, &empty, Some("salary")).unwrap(),
            Value::Integer(0)
        );
        assert_eq!(
            apply(AggregateFunc::Mean, &empty, Some("salary")).unwrap(),
            Value::Integer(0)
        );
        assert!(matches!(
            apply(AggregateFunc::Max, &empty, Some("salary")),
            Err(Error::Domain(_))
        ));
        assert!(matches!(
            apply(AggregateFunc::Min, &empty, Some("salary")),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn sum_of_strings_is_a_type_error() {
        let rel = Relation::infer([[("name".to_string(), Value::Str("a".into()))]
            .into_iter()
            .collect::<Tuple>()])
        .unwrap();
        assert!(matches!(
            apply(AggregateFunc::Sum, &rel, Some("name")),
            Err(Error::Type(_))
        ));
        // Min and max only need a comparable domain; strings qualify.
        assert_eq!(
            apply(AggregateFunc::Min, &rel, Some("name")).unwrap(),
            Value::Str("a".into())
        );
    }

    #[test]
    fn missing_attribute_is_a_name_error() {
        let rel = salaries(&[1]);
        assert!(matches!(
            apply(AggregateFunc::Sum, &rel, Some("missing")),
            Err(Error::UnknownAttribute(_))
        ));
    }
}
