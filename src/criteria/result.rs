//! Conversion of query results into caller-chosen types.

use crate::entity::EntityMeta;
use crate::error::CatteryError;
use crate::store::Hydrator;
use crate::value::{TryGetable, Value};
use std::fmt;

/// One row of a query result before conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Scalar(Value),
    /// A reference to a stored entity
    Entity {
        meta: &'static EntityMeta,
        id: i64,
    },
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Scalar(value) => write!(f, "value {value:?}"),
            ResultValue::Entity { meta, id } => write!(f, "{} {}", meta.name, id),
        }
    }
}

/// What a result type can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Scalar,
    Entity(&'static EntityMeta),
    /// Accepts scalars and entities alike
    Any,
}

/// Types a criteria query can return.
///
/// Implemented for scalar types, `Option` of them, [`ResultValue`] itself, and every
/// entity through `#[derive(Entity)]`.
pub trait FromResult: Sized {
    /// Entity that `CriteriaBuilderFactory::create` uses as the implicit query root
    fn query_root() -> Option<&'static EntityMeta> {
        None
    }

    fn result_kind() -> ResultKind {
        match Self::query_root() {
            Some(meta) => ResultKind::Entity(meta),
            None => ResultKind::Scalar,
        }
    }

    fn from_result(value: ResultValue, hydrator: &mut Hydrator<'_>) -> Result<Self, CatteryError>;
}

fn scalar<T: TryGetable>(value: ResultValue) -> Result<T, CatteryError> {
    match value {
        ResultValue::Scalar(value) => Ok(T::try_get(value)?),
        other => Err(CatteryError::illegal_argument(format!(
            "cannot convert {other} into {}",
            std::any::type_name::<T>()
        ))),
    }
}

macro_rules! impl_from_result_scalar {
    ($($type:ty),* $(,)?) => {
        $(
            impl FromResult for $type {
                fn from_result(
                    value: ResultValue,
                    _hydrator: &mut Hydrator<'_>,
                ) -> Result<Self, CatteryError> {
                    scalar(value)
                }
            }
        )*
    };
}

impl_from_result_scalar!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String
);

impl<T: TryGetable> FromResult for Option<T> {
    fn from_result(value: ResultValue, _hydrator: &mut Hydrator<'_>) -> Result<Self, CatteryError> {
        scalar(value)
    }
}

impl FromResult for ResultValue {
    fn result_kind() -> ResultKind {
        ResultKind::Any
    }

    fn from_result(value: ResultValue, _hydrator: &mut Hydrator<'_>) -> Result<Self, CatteryError> {
        Ok(value)
    }
}
