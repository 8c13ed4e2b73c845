//! Lazy expression nodes.
//!
//! This module provides:
//! - The closed set of tagged expression nodes
//! - Construction-time type checks over abstract type tags
//! - Evaluation against a context mapping
//! - The canonical constructor-call string form

pub mod display;
pub mod error;
pub mod eval;
pub mod expr;
pub mod tag;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, registry, Entry, ExpressionEvaluator, Registry};
pub use expr::{DateParts, Expression, TimeParts};
pub use tag::{Tag, TAG_KEY};
pub use type_checker::{coerce_boolean, TypeChecker, TypeSet, TypeTag};
