//! Type representation for quarry expression trees.
//!
//! Defines the `Ty` enum and type constructors (`TyCon`). Struct types are
//! represented as a constructor application (`Pair<Int, String>`, or
//! `Point<>` for non-generic structs) and resolved through the
//! [`TypeRegistry`](crate::registry::TypeRegistry).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A type constructor -- a named type like `Int`, `String`, `Option`, etc.
///
/// Type constructors are identified by name. They can be nullary (e.g. `Int`)
/// or parameterized (e.g. `Option` with arity 1, `JoinRow` with arity 2).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A quarry type.
///
/// - `Con`: a concrete type constructor (Int, String, Bool, ...) or a generic
///   parameter name inside a struct definition
/// - `App`: a type constructor application (Option<Int>, Pair<A, B>)
/// - `Tuple`: a tuple type (Int, String)
/// - `Fun`: a function type (params -> return)
/// - `Never`: the bottom type
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    /// A concrete type constructor.
    Con(TyCon),
    /// A type constructor applied to arguments.
    App(Box<Ty>, Vec<Ty>),
    /// A tuple type.
    Tuple(Vec<Ty>),
    /// A function type: `(param_types) -> return_type`.
    Fun(Vec<Ty>, Box<Ty>),
    /// The bottom/never type.
    Never,
}

impl Ty {
    /// Create an `Int` type.
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }

    /// Create a `String` type.
    pub fn string() -> Ty {
        Ty::Con(TyCon::new("String"))
    }

    /// Create a `Bool` type.
    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("Bool"))
    }

    /// Create the `Unit` type.
    pub fn unit() -> Ty {
        Ty::Con(TyCon::new("Unit"))
    }

    /// Create an `Option<T>` type. `Option<Option<T>>` collapses to
    /// `Option<T>` since absence is a single sentinel.
    pub fn option(inner: Ty) -> Ty {
        if inner.is_option() {
            return inner;
        }
        Ty::App(Box::new(Ty::Con(TyCon::new("Option"))), vec![inner])
    }

    /// Create a `List<T>` type.
    pub fn list(inner: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("List"))), vec![inner])
    }

    /// Create a function type.
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    /// Create a named struct type with optional type arguments.
    /// Non-generic structs: `Ty::struct_ty("Point", vec![])` -> `Point`
    /// Generic structs: `Ty::struct_ty("Pair", vec![Ty::int(), Ty::string()])` -> `Pair<Int, String>`
    pub fn struct_ty(name: &str, args: Vec<Ty>) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new(name))), args)
    }

    /// Name of the outermost constructor, if any.
    pub fn con_name(&self) -> Option<&str> {
        match self {
            Ty::Con(con) => Some(&con.name),
            Ty::App(con, _) => con.con_name(),
            _ => None,
        }
    }

    /// Type arguments of an application; empty for everything else.
    pub fn args(&self) -> &[Ty] {
        match self {
            Ty::App(_, args) => args,
            _ => &[],
        }
    }

    pub fn is_option(&self) -> bool {
        self.con_name() == Some("Option") && self.args().len() == 1
    }

    /// `Option<T>` -> `T`; every other type is returned unchanged.
    pub fn strip_option(&self) -> &Ty {
        if self.is_option() {
            &self.args()[0]
        } else {
            self
        }
    }

    /// The element type of `List<T>`.
    pub fn list_elem(&self) -> Option<&Ty> {
        match self {
            Ty::App(con, args) if con.con_name() == Some("List") && args.len() == 1 => {
                Some(&args[0])
            }
            _ => None,
        }
    }

    /// Whether a value of type `self` may be bound where `target` is declared.
    ///
    /// Holds for identical types, for `T` into `Option<T>` (absence is the
    /// null sentinel, so lifting is the identity), and for `Never`.
    pub fn is_assignable_to(&self, target: &Ty) -> bool {
        if self == target || *self == Ty::Never {
            return true;
        }
        target.is_option() && !self.is_option() && target.strip_option() == self
    }

    /// Replace generic parameter names with concrete arguments.
    ///
    /// Used when instantiating the fields of a generic struct definition:
    /// `first :: A` in `Pair<A, B>` becomes `first :: Int` for `Pair<Int, String>`.
    pub fn instantiate(&self, params: &[String], args: &[Ty]) -> Ty {
        match self {
            Ty::Con(con) => match params.iter().position(|p| *p == con.name) {
                Some(idx) => args[idx].clone(),
                None => self.clone(),
            },
            Ty::App(con, targs) => {
                let con = con.instantiate(params, args);
                let targs: Vec<Ty> = targs.iter().map(|t| t.instantiate(params, args)).collect();
                if con.con_name() == Some("Option") && targs.len() == 1 {
                    Ty::option(targs.into_iter().next().unwrap_or(Ty::Never))
                } else {
                    Ty::App(Box::new(con), targs)
                }
            }
            Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|t| t.instantiate(params, args)).collect()),
            Ty::Fun(ps, ret) => Ty::Fun(
                ps.iter().map(|t| t.instantiate(params, args)).collect(),
                Box::new(ret.instantiate(params, args)),
            ),
            Ty::Never => Ty::Never,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Ty]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Con(c) => write!(f, "{}", c),
            Ty::App(con, args) => {
                write!(f, "{}", con)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    write_list(f, args)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                write_list(f, elems)?;
                write!(f, ")")
            }
            Ty::Fun(params, ret) => {
                write!(f, "(")?;
                write_list(f, params)?;
                write!(f, ") -> {}", ret)
            }
            Ty::Never => write!(f, "Never"),
        }
    }
}
