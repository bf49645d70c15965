//! Type diagnostics.
//!
//! Unlike parse errors, type errors accumulate: the checker appends them to
//! a vector and keeps going, returning a null type for the failed subtree
//! so no cascading errors are emitted for the same expression. Type names
//! in messages are pre-rendered at construction time; the driver owns the
//! filename and prefixes `file:line:col` when printing.

use kilnc_util::Span;
use thiserror::Error;

/// A semantic diagnostic with its source location.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
}

/// The semantic error taxonomy.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TypeErrorKind {
    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("redeclaration of `{name}`")]
    Redeclaration { name: String },

    #[error("use of undeclared identifier `{name}`")]
    Undeclared { name: String },

    #[error("type mismatch: expected `{expected}`{}", fmt_found(.actual))]
    TypeMismatch {
        expected: String,
        /// Absent for structural mismatches with no single offending type.
        actual: Option<String>,
    },

    #[error("return type mismatch: expected `{expected}`, found `{actual}`")]
    ReturnMismatch { expected: String, actual: String },

    #[error("could not resolve type of variable `{name}`")]
    VariableTypeResolutionFailed { name: String },

    #[error("initializer has {actual_ndim} dimension(s), expected {expected_ndim}")]
    DimensionMismatch {
        expected_ndim: usize,
        actual_ndim: usize,
    },

    #[error("initializer has {actual_size} element(s), expected {expected_size}")]
    ArraySizeMismatch { expected_size: i64, actual_size: i64 },

    #[error("expected array value of type `{expected}`, found `{actual}`")]
    ExpectedArray { expected: String, actual: String },

    #[error("initializer list is not valid for type `{expected}`")]
    UnexpectedList { expected: String },

    #[error("operator `{op}` cannot be applied to `{left}` and `{right}`")]
    BinOpMismatch {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("operator `{op}` cannot be applied to `{operand}`")]
    UnOpMismatch { op: &'static str, operand: String },

    #[error("expression of type `{actual}` is not callable")]
    NotCallable { actual: String },

    #[error("expression of type `{actual}` cannot be indexed")]
    NotIndexable { actual: String },

    /// Reserved: member access is not part of the language yet.
    #[error("unknown field `{name}`")]
    FieldAccess { name: String },

    #[error("cannot assign to a constant")]
    ConstAssign,

    #[error("call has {actual} argument(s), expected {expected}")]
    ArgCountMismatch { expected: usize, actual: usize },

    #[error("expression is not a compile-time constant")]
    NotConst,

    #[error("expression is not an lvalue")]
    NotLValue,
}

fn fmt_found(actual: &Option<String>) -> String {
    match actual {
        Some(actual) => format!(", found `{actual}`"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_with_and_without_actual() {
        let with = TypeErrorKind::TypeMismatch {
            expected: "i32".into(),
            actual: Some("str".into()),
        };
        assert_eq!(
            with.to_string(),
            "type mismatch: expected `i32`, found `str`"
        );
        let without = TypeErrorKind::TypeMismatch {
            expected: "i32".into(),
            actual: None,
        };
        assert_eq!(without.to_string(), "type mismatch: expected `i32`");
    }

    #[test]
    fn test_error_carries_span() {
        let err = TypeError {
            kind: TypeErrorKind::ConstAssign,
            span: Span::new(3, 1, 3, 6),
        };
        assert_eq!(err.span.start_line, 3);
        assert_eq!(err.to_string(), "cannot assign to a constant");
    }
}
