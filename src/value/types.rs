//! ValueType trait for type-safe value conversions
//!
//! The `ValueType` trait maps Rust types to their corresponding `sea_query::Value` variant.
//! Entity attributes are stored through it, so an `age: u32` is kept as
//! `Value::Unsigned(Some(age))` and a `name: String` as `Value::String(Some(name))`.
//!
//! ## Usage
//!
//! ```rust
//! use cattery::value::ValueType;
//! use sea_query::Value;
//!
//! let value = ValueType::into_value(42u32);
//! assert!(matches!(value, Value::Unsigned(Some(42))));
//!
//! let value = ValueType::into_value(None::<String>);
//! assert!(matches!(value, Value::String(None)));
//! ```

use sea_query::Value;

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
pub trait ValueType: Sized {
    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type, if it holds exactly this variant.
    ///
    /// Returns `None` if the value doesn't match the expected variant or is null.
    fn from_value(value: Value) -> Option<Self>;

    /// Return the null variant for this type.
    ///
    /// This is used by `Option<T>` to create the appropriate null `Value` variant
    /// when converting `None`, and by entity hydration when a column is absent.
    fn null_value() -> Value;
}

macro_rules! impl_value_type {
    ($type:ty, $variant:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => v,
                    _ => None,
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_value_type!(bool, Bool);
impl_value_type!(i8, TinyInt);
impl_value_type!(i16, SmallInt);
impl_value_type!(i32, Int);
impl_value_type!(i64, BigInt);
impl_value_type!(u8, TinyUnsigned);
impl_value_type!(u16, SmallUnsigned);
impl_value_type!(u32, Unsigned);
impl_value_type!(u64, BigUnsigned);
impl_value_type!(f32, Float);
impl_value_type!(f64, Double);
impl_value_type!(String, String);

// Pointer-sized integers are stored with their 64-bit counterparts.
impl ValueType for usize {
    fn into_value(self) -> Value {
        Value::BigUnsigned(Some(self as u64))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::BigUnsigned(Some(v)) => usize::try_from(v).ok(),
            _ => None,
        }
    }

    fn null_value() -> Value {
        Value::BigUnsigned(None)
    }
}

impl ValueType for isize {
    fn into_value(self) -> Value {
        Value::BigInt(Some(self as i64))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::BigInt(Some(v)) => isize::try_from(v).ok(),
            _ => None,
        }
    }

    fn null_value() -> Value {
        Value::BigInt(None)
    }
}

impl ValueType for &str {
    fn into_value(self) -> Value {
        Value::String(Some(self.to_string()))
    }

    // Borrowed strings cannot be produced from an owned value.
    fn from_value(_value: Value) -> Option<Self> {
        None
    }

    fn null_value() -> Value {
        Value::String(None)
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn null_value() -> Value {
        T::null_value()
    }
}
