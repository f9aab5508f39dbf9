//! TryGetable trait for safe value extraction
//!
//! Entity hydration and scalar projections both go through `TryGetable`. Unlike
//! `ValueType::from_value`, extraction is lenient across integer widths: a `u32`
//! attribute can be read back as `i64`, and `SIZE(...)` results can be read as `u32`,
//! as long as the value fits.

use crate::value::compare::Scalar;
use crate::value::ValueType;
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// Value conversion failed (e.g., overflow, invalid format)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ## Usage
///
/// ```rust
/// use cattery::value::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let value = Value::Unsigned(Some(42));
/// let result: Result<i64, ValueExtractionError> = TryGetable::try_get(value);
/// assert_eq!(result, Ok(42));
///
/// let null_value = Value::Int(None);
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(null_value);
/// assert!(matches!(result, Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: ValueType {
    /// Try to extract a value from `sea_query::Value`.
    ///
    /// Returns:
    /// - `Ok(T)` if the value matches the expected type and is not null
    /// - `Err(ValueExtractionError::NullValue)` if the value is null
    /// - `Err(ValueExtractionError::TypeMismatch)` if the value type doesn't match
    /// - `Err(ValueExtractionError::ConversionError)` if conversion fails (e.g., overflow)
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;

    /// Try to extract a value, allowing null values to return `None`.
    fn try_get_opt(value: Value) -> Result<Option<Self>, ValueExtractionError> {
        match Self::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", value),
    }
}

macro_rules! impl_try_getable_integer {
    ($type:ty) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                match Scalar::from_value(&value) {
                    Some(Scalar::Int(v)) => <$type>::try_from(v).map_err(|_| {
                        ValueExtractionError::ConversionError(format!(
                            "{} is out of range for {}",
                            v,
                            stringify!($type)
                        ))
                    }),
                    Some(Scalar::Null) => Err(ValueExtractionError::NullValue),
                    _ => Err(mismatch("integer", &value)),
                }
            }
        }
    };
}

impl_try_getable_integer!(i8);
impl_try_getable_integer!(i16);
impl_try_getable_integer!(i32);
impl_try_getable_integer!(i64);
impl_try_getable_integer!(isize);
impl_try_getable_integer!(u8);
impl_try_getable_integer!(u16);
impl_try_getable_integer!(u32);
impl_try_getable_integer!(u64);
impl_try_getable_integer!(usize);

impl TryGetable for f64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match Scalar::from_value(&value) {
            Some(Scalar::Float(v)) => Ok(v),
            Some(Scalar::Int(v)) => Ok(v as f64),
            Some(Scalar::Null) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("decimal", &value)),
        }
    }
}

impl TryGetable for f32 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        f64::try_get(value).map(|v| v as f32)
    }
}

impl TryGetable for bool {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(v)) => Ok(v),
            Value::Bool(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Bool", &value)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v),
            Value::String(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("String", &value)),
        }
    }
}

impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        T::try_get_opt(value)
    }
}
