//! Runtime errors raised while evaluating compiled expressions.
//!
//! Member getters and indexer invokers live with the type model, so the error
//! they report lives here too; the evaluator re-exports it.

use crate::Name;

/// Result of evaluating an expression.
pub type EvalResult = Result<crate::Value, EvalError>;

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A member or indexer was read through a null value.
    #[error("object reference not set to an instance of an object (reading '{member}')")]
    NullReference { member: Name },

    /// A conversion between incompatible runtime types.
    #[error("unable to cast value of type '{from}' to type '{to}'")]
    InvalidCast { from: String, to: Name },

    /// A list was indexed outside its bounds.
    #[error("index {index} was outside the bounds of a list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A record did not carry the field a member getter expected.
    #[error("record of type '{type_name}' has no field '{field}'")]
    MissingField { type_name: Name, field: Name },

    /// An operand had the wrong runtime type for an operation.
    #[error("expected a value of type '{expected}', found '{found}'")]
    TypeMismatch { expected: &'static str, found: String },

    /// Integer arithmetic overflowed.
    #[error("integer overflow in '{operation}'")]
    Overflow { operation: &'static str },

    /// Error raised by host-supplied getters or invokers.
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    /// Create a custom error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }

    /// Whether this error is the null dereference that null-safe accessors
    /// turn into a null result.
    pub fn is_null_reference(&self) -> bool {
        matches!(self, EvalError::NullReference { .. })
    }
}
