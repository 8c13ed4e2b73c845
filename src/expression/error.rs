//! Error types for expression construction.

use thiserror::Error;

use crate::expression::tag::Tag;
use crate::expression::type_checker::TypeSet;

/// Errors that can occur while building an expression node
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// And/Or with fewer than the required statements
    #[error("{operator} must have at least {minimum} statements, got {actual}")]
    TooFewStatements {
        operator: Tag,
        minimum: usize,
        actual: usize,
    },

    /// Equal operands that never evaluate to the same types
    #[error("{operator} statements must have the same type, got {left} and {right}")]
    TypeMismatch {
        operator: Tag,
        left: TypeSet,
        right: TypeSet,
    },

    /// A field outside the categories its node accepts
    #[error("{operator} field '{field}' must be {expected}, got {actual}")]
    InvalidOperand {
        operator: Tag,
        field: &'static str,
        expected: &'static str,
        actual: TypeSet,
    },

    /// Wrong number of positional arguments
    #[error("{operator} expects {minimum} to {maximum} arguments, got {actual}")]
    ArgumentCount {
        operator: Tag,
        minimum: usize,
        maximum: usize,
        actual: usize,
    },
}

/// Result type for expression construction
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::type_checker::TypeTag;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::TooFewStatements {
            operator: Tag::And,
            minimum: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "And must have at least 2 statements, got 1");

        let err = ExpressionError::TypeMismatch {
            operator: Tag::Equal,
            left: TypeSet::of(TypeTag::Number),
            right: TypeSet::of(TypeTag::String),
        };
        assert_eq!(
            err.to_string(),
            "Equal statements must have the same type, got {Number} and {String}"
        );

        let err = ExpressionError::InvalidOperand {
            operator: Tag::Get,
            field: "k",
            expected: "a string",
            actual: TypeSet::of(TypeTag::Number),
        };
        assert_eq!(
            err.to_string(),
            "Get field 'k' must be a string, got {Number}"
        );

        let err = ExpressionError::ArgumentCount {
            operator: Tag::Len,
            minimum: 1,
            maximum: 1,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Len expects 1 to 1 arguments, got 3");
    }
}
