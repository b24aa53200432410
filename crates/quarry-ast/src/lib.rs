//! Typed expression trees for quarry.
//!
//! This crate is the host facility the rewriter works against: types
//! ([`Ty`]), read-only type introspection ([`TypeRegistry`]), function
//! expressions ([`Lambda`], [`Expr`]), a generic rebuild traversal
//! ([`Expr::map_children`]) and a reference evaluator ([`CompiledFn`]).

pub mod error;
pub mod eval;
pub mod expr;
pub mod registry;
pub mod ty;
pub mod walk;

pub use error::{AstError, EvalError};
pub use eval::{CompiledFn, Record, Value};
pub use expr::{BinOp, Builtin, Expr, Lambda, Literal, Param, ParamId, UnaryOp};
pub use registry::{FieldDef, StructDef, TypeRegistry};
pub use ty::{Ty, TyCon};
pub use walk::referenced_params;
