//! Errors raised by the type registry and the reference evaluator.

use thiserror::Error;

use crate::ty::Ty;

/// A failure while resolving types against the [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("type `{0}` is already registered")]
    DuplicateType(String),
    #[error("struct `{name}` declares field `{field}` more than once")]
    DuplicateField { name: String, field: String },
    #[error("unknown type `{0}`")]
    UnknownType(Ty),
    #[error("type `{0}` is not a struct and has no members")]
    NotAStruct(Ty),
    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("type `{ty}` has no member `{member}`")]
    NoSuchMember { ty: Ty, member: String },
    #[error("`{ty}` has {expected} field(s), {found} value(s) given")]
    RecordArity { ty: Ty, expected: usize, found: usize },
}

/// A failure while evaluating a compiled expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("parameter `{0}` is not bound")]
    UnboundParam(String),
    #[error("function expects {expected} argument(s), found {found}")]
    Arity { expected: usize, found: usize },
    #[error("record has no field `{0}`")]
    NoSuchField(String),
    #[error("{op}: unsupported operand {value}")]
    TypeMismatch { op: &'static str, value: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in `{0}`")]
    Overflow(&'static str),
    #[error("value {0} is not callable")]
    NotCallable(String),
}
