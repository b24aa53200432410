//! Rewrite errors. All of them are raised while composing, before anything
//! is evaluated.

use quarry_ast::{AstError, Ty};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The carrier has no member whose type fits the expected type.
    #[error("cannot find a member of type `{expected}` in `{carrier}`")]
    NoMatchingMember { carrier: Ty, expected: Ty },
    /// The carrier has members of the expected type, but fewer than the
    /// number of parameters that need one.
    #[error("`{carrier}` has {found} member(s) of type `{expected}`, {required} needed")]
    InsufficientMembers {
        carrier: Ty,
        expected: Ty,
        required: usize,
        found: usize,
    },
    #[error("at least one parameter is required")]
    EmptyParameterList,
    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),
    /// The body refers to a parameter the lambda neither declares nor binds
    /// in a nested lambda. It would be left dangling once the declared
    /// parameters are replaced by the carrier.
    #[error("parameter `{0}` is referenced but not declared")]
    UndeclaredParameter(String),
    #[error("expected a function of {expected} parameter(s), found {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("{order:?} is not a permutation of {arity} parameter position(s)")]
    InvalidPermutation { order: Vec<usize>, arity: usize },
    #[error(transparent)]
    Ast(#[from] AstError),
}
