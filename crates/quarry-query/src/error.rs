//! Query composition and configuration errors.

use std::path::PathBuf;

use quarry_ast::{AstError, EvalError, Ty};
use quarry_rewrite::RewriteError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Ast(#[from] AstError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("join key types are not comparable: outer `{outer}`, inner `{inner}`")]
    KeyTypeMismatch { outer: Ty, inner: Ty },
    #[error("{op}: function expects `{expected}` but the source yields `{found}`")]
    SelectorInputMismatch {
        op: &'static str,
        expected: Ty,
        found: Ty,
    },
    #[error("flatten expects a correlated source, found `{0}`")]
    NotAGrouping(Ty),
    #[error("predicate must return `Bool`, found `{0}`")]
    PredicateNotBool(Ty),
    #[error("{op}: element types differ (`{left}` vs `{right}`)")]
    ElementTypeMismatch {
        op: &'static str,
        left: Ty,
        right: Ty,
    },
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error("malformed {0} row")]
    MalformedRow(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
