//! Value type system for cattery
//!
//! Stored attributes and query literals are `sea_query::Value`s. This module provides
//! the conversions between Rust types and those values, plus the comparison rules the
//! criteria executor uses for filtering and ordering.
//!
//! ## Traits
//!
//! - **`ValueType`** - Maps Rust types to their corresponding `sea_query::Value` variant
//! - **`TryGetable`** - Safe value extraction with error handling

pub mod compare;
pub mod try_getable;
pub mod types;

pub use sea_query::Value;
pub use try_getable::{TryGetable, ValueExtractionError};
pub use types::ValueType;

use std::fmt;

/// Scalar kind of an attribute or literal, used to type-check criteria expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Text,
}

impl ValueKind {
    /// Kind of a concrete value; `None` for nulls and variants cattery does not store
    pub fn of(value: &Value) -> Option<ValueKind> {
        match compare::Scalar::from_value(value)? {
            compare::Scalar::Null => None,
            compare::Scalar::Bool(_) => Some(ValueKind::Bool),
            compare::Scalar::Int(_) => Some(ValueKind::Integer),
            compare::Scalar::Float(_) => Some(ValueKind::Float),
            compare::Scalar::Text(_) => Some(ValueKind::Text),
        }
    }

    /// Whether values of the two kinds can be compared with each other
    pub fn is_comparable_with(self, other: ValueKind) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "decimal",
            ValueKind::Text => "string",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_of() {
        assert_eq!(ValueKind::of(&Value::Unsigned(Some(5))), Some(ValueKind::Integer));
        assert_eq!(ValueKind::of(&Value::BigInt(Some(-1))), Some(ValueKind::Integer));
        assert_eq!(ValueKind::of(&Value::Double(Some(1.5))), Some(ValueKind::Float));
        assert_eq!(
            ValueKind::of(&Value::String(Some("Mugi".to_string()))),
            Some(ValueKind::Text)
        );
        assert_eq!(ValueKind::of(&Value::Int(None)), None);
    }

    #[test]
    fn test_value_kind_comparability() {
        assert!(ValueKind::Integer.is_comparable_with(ValueKind::Float));
        assert!(ValueKind::Text.is_comparable_with(ValueKind::Text));
        assert!(!ValueKind::Text.is_comparable_with(ValueKind::Integer));
        assert!(!ValueKind::Bool.is_comparable_with(ValueKind::Integer));
    }
}
