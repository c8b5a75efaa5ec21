//! `round(x, n)` — round to n fractional digits.

use super::Function;
use crate::error::{Error, Result};
use crate::types::Value;

pub struct Round;

impl Function for Round {
    fn name(&self) -> &'static str {
        "round"
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        let [value, digits] = args else {
            return Err(Error::Type(format!(
                "round takes 2 arguments, got {}",
                args.len()
            )));
        };
        let digits = match digits {
            Value::Integer(n) if *n >= 0 => *n as u32,
            Value::Integer(_) => {
                return Err(Error::Domain("round precision must be non-negative".into()));
            }
            other => {
                return Err(Error::Type(format!(
                    "round precision must be an integer, got {}",
                    other.type_name()
                )));
            }
        };
        match value {
            // Decimal stays decimal, just rescaled.
            Value::Decimal(d) => Ok(Value::Decimal(d.round_dp(digits))),
            // Integers carry no fractional digits to round.
            Value::Integer(i) => Ok(Value::Integer(*i)),
            other => Err(Error::Type(format!(
                "round expects a numeric value, got {}",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn rounds_decimals_and_preserves_the_type() {
        assert_eq!(
            Round.call(&[dec("123.456"), Value::Integer(2)]).unwrap(),
            dec("123.46")
        );
        assert_eq!(
            Round.call(&[dec("3.2"), Value::Integer(0)]).unwrap(),
            dec("3")
        );
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(
            Round.call(&[Value::Integer(42), Value::Integer(2)]).unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn bad_arguments_error() {
        assert!(Round.call(&[dec("1.5")]).is_err());
        assert!(Round
            .call(&[Value::Str("x".into()), Value::Integer(1)])
            .is_err());
        assert!(Round.call(&[dec("1.5"), Value::Integer(-1)]).is_err());
    }
}
