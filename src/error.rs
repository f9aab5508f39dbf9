//! Error types shared by the store, repositories and the criteria builder.

use crate::value::ValueExtractionError;
use std::fmt;

/// Errors raised by cattery operations
#[derive(Debug, Clone, PartialEq)]
pub enum CatteryError {
    /// An argument passed to a query or repository method is invalid
    /// (unknown attribute, ambiguous relative path, bad alias, ...)
    IllegalArgument(String),
    /// An entity violates one of its declared constraints
    Validation(String),
    /// An entity (or an entity it references) has not been persisted yet
    TransientEntity(String),
    /// A flush would leave a dangling reference between tables
    ConstraintViolation(String),
    /// No row exists for the requested identifier
    EntityNotFound {
        entity: &'static str,
        id: i64,
    },
    /// `get_single_result` found nothing
    NoResult,
    /// `get_single_result` found more than one row
    NonUniqueResult(usize),
    /// A stored or selected value could not be converted
    Value(ValueExtractionError),
    /// Transaction bookkeeping failed
    Transaction(TransactionError),
}

impl CatteryError {
    /// Build an `IllegalArgument` error from anything printable
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        CatteryError::IllegalArgument(message.into())
    }

    /// Whether this error reports an invalid argument
    pub fn is_illegal_argument(&self) -> bool {
        matches!(self, CatteryError::IllegalArgument(_))
    }
}

impl fmt::Display for CatteryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatteryError::IllegalArgument(s) => write!(f, "Illegal argument: {s}"),
            CatteryError::Validation(s) => write!(f, "Validation failed: {s}"),
            CatteryError::TransientEntity(s) => write!(f, "Transient entity: {s}"),
            CatteryError::ConstraintViolation(s) => write!(f, "Constraint violation: {s}"),
            CatteryError::EntityNotFound { entity, id } => {
                write!(f, "No {entity} with id {id}")
            }
            CatteryError::NoResult => write!(f, "Query returned no result"),
            CatteryError::NonUniqueResult(n) => {
                write!(f, "Query returned {n} results where one was expected")
            }
            CatteryError::Value(e) => write!(f, "Value error: {e}"),
            CatteryError::Transaction(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CatteryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatteryError::Value(e) => Some(e),
            CatteryError::Transaction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValueExtractionError> for CatteryError {
    fn from(err: ValueExtractionError) -> Self {
        CatteryError::Value(err)
    }
}

impl From<TransactionError> for CatteryError {
    fn from(err: TransactionError) -> Self {
        CatteryError::Transaction(err)
    }
}

/// Transaction error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Transaction already committed or rolled back
    TransactionClosed,
    /// An inner transaction is still open, or the snapshot stack is out of step
    NestedTransactionError(String),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::TransactionClosed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
            TransactionError::NestedTransactionError(s) => {
                write!(f, "Nested transaction error: {s}")
            }
        }
    }
}

impl std::error::Error for TransactionError {}
