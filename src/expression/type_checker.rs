//! Type tags and construction-time compatibility checks.

use std::fmt;

use crate::expression::{Expression, ExpressionError, ExpressionResult, Tag};
use crate::value::Value;

/// Abstract result categories of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    /// Covers integers too
    Number,
    String,
    /// Objects and lists
    Composite,
    Any,
}

impl TypeTag {
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Composite,
        TypeTag::Any,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of type tags
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeSet(u8);

impl TypeSet {
    pub const fn empty() -> Self {
        TypeSet(0)
    }

    pub fn of(tag: TypeTag) -> Self {
        TypeSet(tag.bit())
    }

    pub fn with(self, tag: TypeTag) -> Self {
        TypeSet(self.0 | tag.bit())
    }

    pub fn union(self, other: TypeSet) -> Self {
        TypeSet(self.0 | other.0)
    }

    pub fn contains(self, tag: TypeTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(self, other: TypeSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Non-empty and within `other`
    fn is_within(self, other: TypeSet) -> bool {
        !self.is_empty() && self.is_subset(other)
    }

    pub fn iter(self) -> impl Iterator<Item = TypeTag> {
        TypeTag::ALL.into_iter().filter(move |tag| self.contains(*tag))
    }
}

impl FromIterator<TypeTag> for TypeSet {
    fn from_iter<I: IntoIterator<Item = TypeTag>>(iter: I) -> Self {
        iter.into_iter().fold(TypeSet::empty(), TypeSet::with)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, tag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", tag)?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Wrap a value in Bool unless it already evaluates to a boolean only
pub fn coerce_boolean(value: Value) -> Value {
    let boolean_only = match &value {
        Value::Boolean(_) => true,
        Value::Expression(expr) => expr.types() == TypeSet::of(TypeTag::Boolean),
        _ => false,
    };
    if boolean_only {
        value
    } else {
        Expression::Bool { operand: value }.into()
    }
}

/// Checks field compatibility for one node being constructed
pub struct TypeChecker {
    operator: Tag,
}

impl TypeChecker {
    pub fn new(operator: Tag) -> Self {
        Self { operator }
    }

    fn reject(&self, field: &'static str, expected: &'static str, value: &Value) -> ExpressionError {
        ExpressionError::InvalidOperand {
            operator: self.operator,
            field,
            expected,
            actual: value.types(),
        }
    }

    /// Variadic nodes need a minimum number of statements
    pub fn check_statement_count(&self, statements: &[Value], minimum: usize) -> ExpressionResult<()> {
        if statements.len() < minimum {
            return Err(ExpressionError::TooFewStatements {
                operator: self.operator,
                minimum,
                actual: statements.len(),
            });
        }
        Ok(())
    }

    /// Both statements must declare the same type set
    pub fn check_same_types(&self, left: &Value, right: &Value) -> ExpressionResult<()> {
        let (left, right) = (left.types(), right.types());
        if left != right {
            return Err(ExpressionError::TypeMismatch {
                operator: self.operator,
                left,
                right,
            });
        }
        Ok(())
    }

    /// Operands of Greater and Less
    pub fn check_comparable(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => {
                matches!(**expr, Expression::Date(_) | Expression::DateTime { .. })
                    || expr.types().is_within(TypeSet::of(TypeTag::Number))
            }
            Value::Null
            | Value::Integer(_)
            | Value::Float(_)
            | Value::Decimal(_)
            | Value::Date(_)
            | Value::DateTime(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a number, date or datetime", value))
        }
    }

    /// Target of Get
    pub fn check_mapping(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr.types() == TypeSet::of(TypeTag::Composite),
            Value::Map(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a mapping", value))
        }
    }

    /// Key of Get
    pub fn check_string(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr.types() == TypeSet::of(TypeTag::String),
            Value::String(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a string", value))
        }
    }

    /// Key of In
    pub fn check_member_key(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr
                .types()
                .is_within(TypeSet::of(TypeTag::String).with(TypeTag::Number)),
            Value::String(_) | Value::Integer(_) | Value::Float(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a string or number", value))
        }
    }

    /// Container of In
    pub fn check_container(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr.types() == TypeSet::of(TypeTag::Composite),
            Value::List(_) | Value::Map(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a list or mapping", value))
        }
    }

    /// Numeric fields of Date and DateTime
    pub fn check_calendar_field(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr
                .types()
                .is_within(TypeSet::of(TypeTag::Number).with(TypeTag::Any)),
            Value::Null | Value::Integer(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "an integer or null", value))
        }
    }

    /// Fields of TimeDelta
    pub fn check_duration_field(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        match value {
            Value::Integer(_) | Value::Float(_) => Ok(()),
            _ => Err(self.reject(field, "a number", value)),
        }
    }

    /// Operand of Len
    pub fn check_sized(&self, field: &'static str, value: &Value) -> ExpressionResult<()> {
        let accepted = match value {
            Value::Expression(expr) => expr
                .types()
                .is_within(TypeSet::of(TypeTag::String).with(TypeTag::Composite)),
            Value::String(_) | Value::List(_) | Value::Map(_) => true,
            _ => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(self.reject(field, "a string, list or mapping", value))
        }
    }
}
