//! Comparison rules for stored values.
//!
//! Integers of every width compare with each other and with floats, strings compare by
//! code point, and nulls never satisfy a comparison. For ordering, nulls sort last in
//! ascending order (PostgreSQL's default).

use sea_query::Value;
use std::cmp::Ordering;

/// A borrowed, width-normalised view of a `Value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Text(&'a str),
}

impl<'a> Scalar<'a> {
    /// Normalise a value; `None` for variants cattery does not store (bytes, chars, ...)
    pub fn from_value(value: &'a Value) -> Option<Scalar<'a>> {
        fn int<T: Into<i128> + Copy>(v: &Option<T>) -> Scalar<'static> {
            v.map_or(Scalar::Null, |v| Scalar::Int(v.into()))
        }

        let scalar = match value {
            Value::Bool(v) => v.map_or(Scalar::Null, Scalar::Bool),
            Value::TinyInt(v) => int(v),
            Value::SmallInt(v) => int(v),
            Value::Int(v) => int(v),
            Value::BigInt(v) => int(v),
            Value::TinyUnsigned(v) => int(v),
            Value::SmallUnsigned(v) => int(v),
            Value::Unsigned(v) => int(v),
            Value::BigUnsigned(v) => int(v),
            Value::Float(v) => v.map_or(Scalar::Null, |v| Scalar::Float(f64::from(v))),
            Value::Double(v) => v.map_or(Scalar::Null, Scalar::Float),
            Value::String(v) => v.as_deref().map_or(Scalar::Null, Scalar::Text),
            _ => return None,
        };
        Some(scalar)
    }
}

/// Whether the value is SQL NULL
pub fn is_null(value: &Value) -> bool {
    matches!(Scalar::from_value(value), Some(Scalar::Null))
}

/// Compare two values with SQL semantics: `None` when either side is null or the
/// values are of incomparable kinds.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (Scalar::from_value(left)?, Scalar::from_value(right)?) {
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(&b)),
        (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(&b)),
        (Scalar::Int(a), Scalar::Float(b)) => (a as f64).partial_cmp(&b),
        (Scalar::Float(a), Scalar::Int(b)) => a.partial_cmp(&(b as f64)),
        (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(&b),
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Position of a value's kind in the sort order. Columns hold one kind, so the
/// order between kinds only has to be consistent.
fn sort_rank(scalar: Option<Scalar<'_>>) -> u8 {
    match scalar {
        Some(Scalar::Bool(_)) => 0,
        Some(Scalar::Int(_)) => 1,
        Some(Scalar::Float(f)) if !f.is_nan() => 1,
        Some(Scalar::Float(_)) => 2,
        Some(Scalar::Text(_)) => 3,
        None => 4,
        Some(Scalar::Null) => 5,
    }
}

/// Total order used by ORDER BY, matching PostgreSQL: NaN after every number, nulls
/// last.
pub fn order_ascending(left: &Value, right: &Value) -> Ordering {
    let rank = |value: &Value| sort_rank(Scalar::from_value(value));
    // Within a rank `compare` only gives up on NaN/NaN and null/null, which tie
    rank(left)
        .cmp(&rank(right))
        .then_with(|| compare(left, right).unwrap_or(Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_across_integer_widths() {
        assert_eq!(
            compare(&Value::Unsigned(Some(5)), &Value::BigInt(Some(5))),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare(&Value::Unsigned(Some(10)), &Value::BigInt(Some(11))),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Value::Int(Some(2)), &Value::Double(Some(1.5))),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_strings_by_code_point() {
        let a = Value::String(Some("1-さくら".to_string()));
        let b = Value::String(Some("2-きなこ".to_string()));
        assert_eq!(compare(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn test_null_never_compares() {
        assert_eq!(compare(&Value::Unsigned(None), &Value::Unsigned(Some(1))), None);
        assert_eq!(
            compare(&Value::String(Some("x".into())), &Value::Unsigned(Some(1))),
            None
        );
    }

    #[test]
    fn test_order_puts_nan_after_numbers_and_before_null() {
        let mut values: Vec<Value> = (0..40)
            .map(|i| match i % 5 {
                0 => Value::Double(Some(f64::NAN)),
                1 => Value::Double(None),
                _ => Value::Double(Some(f64::from(40 - i))),
            })
            .collect();
        values.sort_by(order_ascending);

        let kinds: Vec<u8> = values
            .iter()
            .map(|v| match v {
                Value::Double(Some(f)) if f.is_nan() => 1,
                Value::Double(Some(_)) => 0,
                _ => 2,
            })
            .collect();
        assert!(kinds.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        assert_eq!(kinds.iter().filter(|k| **k == 1).count(), 8);

        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| match v {
                Value::Double(Some(f)) if !f.is_nan() => Some(*f),
                _ => None,
            })
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]), "{numbers:?}");
    }

    #[test]
    fn test_order_mixes_integer_widths_and_floats() {
        assert_eq!(
            order_ascending(&Value::Int(Some(2)), &Value::Double(Some(2.5))),
            Ordering::Less
        );
        assert_eq!(
            order_ascending(&Value::Double(Some(-0.0)), &Value::Double(Some(0.0))),
            Ordering::Equal
        );
        assert_eq!(
            order_ascending(&Value::BigInt(Some(7)), &Value::Unsigned(Some(7))),
            Ordering::Equal
        );
    }

    #[test]
    fn test_order_puts_nulls_last() {
        let mut values = vec![
            Value::Unsigned(None),
            Value::Unsigned(Some(3)),
            Value::Unsigned(Some(1)),
        ];
        values.sort_by(order_ascending);
        assert_eq!(
            values,
            vec![Value::Unsigned(Some(1)), Value::Unsigned(Some(3)), Value::Unsigned(None)]
        );
    }
}
