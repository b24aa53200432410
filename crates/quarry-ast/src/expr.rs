//! Expression trees.
//!
//! A [`Lambda`] is a function expression: an ordered list of declared
//! [`Param`]s and a body [`Expr`]. Trees are immutable values; every
//! transform builds a new tree. Each node carries (or can compute) its
//! result type so transforms never need to re-infer anything.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::ty::Ty;

static NEXT_PARAM_ID: AtomicU32 = AtomicU32::new(0);

/// Identity of a declared parameter.
///
/// Two parameters with the same name are still distinct unless they share
/// an id; references resolve by id, never by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(pub u32);

impl ParamId {
    /// Allocate a process-unique id.
    pub fn fresh() -> Self {
        ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A declared parameter: identity, display name and declared type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub id: ParamId,
    pub name: String,
    pub ty: Ty,
}

impl Param {
    /// Declare a new parameter with a fresh identity.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Param {
            id: ParamId::fresh(),
            name: name.into(),
            ty,
        }
    }
}

/// Constant leaf values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Unit,
    /// The absent sentinel. Typed `Never` so it fits any slot.
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Literal {
    pub fn ty(&self) -> Ty {
        match self {
            Literal::Unit => Ty::unit(),
            Literal::Null => Ty::Never,
            Literal::Bool(_) => Ty::bool(),
            Literal::Int(_) => Ty::int(),
            Literal::Str(_) => Ty::string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Unit => write!(f, "()"),
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// `lhs ?? rhs`: `lhs` unless it is null.
    Coalesce,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Coalesce => "??",
        }
    }

    fn result_ty(self, lhs: &Ty, rhs: &Ty) -> Ty {
        match self {
            BinOp::Add => {
                let string = Ty::string();
                if lhs.strip_option() == &string || rhs.strip_option() == &string {
                    string
                } else {
                    lhs.clone()
                }
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => lhs.clone(),
            BinOp::Eq
            | BinOp::Ne
            | BinOp::Lt
            | BinOp::Le
            | BinOp::Gt
            | BinOp::Ge
            | BinOp::And
            | BinOp::Or => Ty::bool(),
            BinOp::Coalesce => {
                if *rhs == Ty::Never {
                    lhs.clone()
                } else {
                    rhs.clone()
                }
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Functions the evaluator knows natively.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    /// `to_string(x)`; null renders as the empty string.
    ToString,
    /// `len(s)` for strings (in chars) and lists.
    Len,
    /// `is_empty(list)`.
    IsEmpty,
    /// `any(list, predicate)`.
    Any,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::ToString => "to_string",
            Builtin::Len => "len",
            Builtin::IsEmpty => "is_empty",
            Builtin::Any => "any",
        }
    }

    fn result_ty(self) -> Ty {
        match self {
            Builtin::ToString => Ty::string(),
            Builtin::Len => Ty::int(),
            Builtin::IsEmpty | Builtin::Any => Ty::bool(),
        }
    }
}

/// An expression node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a declared parameter.
    Param(Param),
    Lit(Literal),
    /// `object.name`
    Member {
        object: Box<Expr>,
        name: String,
        ty: Ty,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: Ty,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        ty: Ty,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
        ty: Ty,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        ty: Ty,
    },
    /// Record construction; fields are evaluated in the listed order.
    Construct {
        ty: Ty,
        fields: Vec<(String, Expr)>,
    },
    Tuple(Vec<Expr>),
    List {
        elem_ty: Ty,
        elements: Vec<Expr>,
    },
    /// A nested function expression.
    Lambda(Box<Lambda>),
    /// Call of a function-valued expression.
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
        ty: Ty,
    },
}

impl Expr {
    pub fn param(param: &Param) -> Expr {
        Expr::Param(param.clone())
    }

    pub fn int(n: i64) -> Expr {
        Expr::Lit(Literal::Int(n))
    }

    pub fn str(s: impl Into<String>) -> Expr {
        Expr::Lit(Literal::Str(s.into()))
    }

    pub fn bool(b: bool) -> Expr {
        Expr::Lit(Literal::Bool(b))
    }

    pub fn null() -> Expr {
        Expr::Lit(Literal::Null)
    }

    /// Member access with an already-known member type. Use
    /// [`TypeRegistry::member_access`](crate::TypeRegistry::member_access)
    /// to resolve the type from the object's struct definition.
    pub fn member(object: Expr, name: impl Into<String>, ty: Ty) -> Expr {
        Expr::Member {
            object: Box::new(object),
            name: name.into(),
            ty,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        let ty = match op {
            UnaryOp::Not => Ty::bool(),
            UnaryOp::Neg => operand.ty(),
        };
        Expr::Unary {
            op,
            operand: Box::new(operand),
            ty,
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let ty = op.result_ty(&lhs.ty(), &rhs.ty());
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
        }
    }

    pub fn call(func: Builtin, args: Vec<Expr>) -> Expr {
        Expr::Call {
            func,
            args,
            ty: func.result_ty(),
        }
    }

    pub fn if_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        let ty = match then_branch.ty() {
            Ty::Never => else_branch.ty(),
            ty => ty,
        };
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            ty,
        }
    }

    pub fn construct(ty: Ty, fields: Vec<(String, Expr)>) -> Expr {
        Expr::Construct { ty, fields }
    }

    pub fn tuple(elems: Vec<Expr>) -> Expr {
        Expr::Tuple(elems)
    }

    pub fn list(elem_ty: Ty, elements: Vec<Expr>) -> Expr {
        Expr::List { elem_ty, elements }
    }

    pub fn lambda(lambda: Lambda) -> Expr {
        Expr::Lambda(Box::new(lambda))
    }

    pub fn invoke(callee: Expr, args: Vec<Expr>) -> Expr {
        let ty = match callee.ty() {
            Ty::Fun(_, ret) => *ret,
            _ => Ty::Never,
        };
        Expr::Invoke {
            callee: Box::new(callee),
            args,
            ty,
        }
    }

    /// The static result type of this node.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Param(p) => p.ty.clone(),
            Expr::Lit(lit) => lit.ty(),
            Expr::Member { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::If { ty, .. }
            | Expr::Construct { ty, .. }
            | Expr::Invoke { ty, .. } => ty.clone(),
            Expr::Tuple(elems) => Ty::Tuple(elems.iter().map(Expr::ty).collect()),
            Expr::List { elem_ty, .. } => Ty::list(elem_ty.clone()),
            Expr::Lambda(lambda) => lambda.ty(),
        }
    }
}

/// A function expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Expr,
}

impl Lambda {
    pub fn new(params: Vec<Param>, body: Expr) -> Self {
        Lambda { params, body }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> Vec<Ty> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn ret_ty(&self) -> Ty {
        self.body.ty()
    }

    pub fn ty(&self) -> Ty {
        Ty::fun(self.param_types(), self.ret_ty())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param(p) => write!(f, "{}", p.name),
            Expr::Lit(lit) => write!(f, "{}", lit),
            Expr::Member { object, name, .. } => write!(f, "{}.{}", object, name),
            Expr::Unary { op, operand, .. } => write!(f, "{}{}", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Call { func, args, .. } => {
                write!(f, "{}(", func.name())?;
                write_joined(f, args)?;
                write!(f, ")")
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => write!(f, "if {} then {} else {}", cond, then_branch, else_branch),
            Expr::Construct { ty, fields } => {
                write!(f, "{} {{", ty)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Expr::Tuple(elems) => {
                write!(f, "(")?;
                write_joined(f, elems)?;
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::List { elements, .. } => {
                write!(f, "[")?;
                write_joined(f, elements)?;
                write!(f, "]")
            }
            Expr::Lambda(lambda) => write!(f, "({})", lambda),
            Expr::Invoke { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                write_joined(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        write!(f, "| {}", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_params_are_distinct() {
        let a = Param::new("x", Ty::int());
        let b = Param::new("x", Ty::int());
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn string_addition_is_string_typed() {
        let i = Param::new("i", Ty::int());
        let s = Param::new("s", Ty::string());
        let body = Expr::binary(BinOp::Add, Expr::param(&s), Expr::param(&i));
        assert_eq!(body.ty(), Ty::string());
        let lambda = Lambda::new(vec![i, s], body);
        assert_eq!(lambda.to_string(), "|i: Int, s: String| (s + i)");
        assert_eq!(lambda.ty().to_string(), "(Int, String) -> String");
    }

    #[test]
    fn comparison_and_coalesce_types() {
        let x = Param::new("x", Ty::option(Ty::int()));
        let eq = Expr::binary(BinOp::Eq, Expr::param(&x), Expr::int(1));
        assert_eq!(eq.ty(), Ty::bool());
        let co = Expr::binary(BinOp::Coalesce, Expr::param(&x), Expr::int(0));
        assert_eq!(co.ty(), Ty::int());
        let keep = Expr::binary(BinOp::Coalesce, Expr::param(&x), Expr::null());
        assert_eq!(keep.ty(), Ty::option(Ty::int()));
    }

    #[test]
    fn display_compound_nodes() {
        let p = Param::new("p", Ty::struct_ty("Point", vec![]));
        let x = Expr::member(Expr::param(&p), "x", Ty::int());
        let rec = Expr::construct(
            Ty::struct_ty("Point", vec![]),
            vec![("x".into(), Expr::unary(UnaryOp::Neg, x.clone())), ("y".into(), Expr::int(0))],
        );
        assert_eq!(rec.to_string(), "Point { x: -p.x, y: 0 }");
        assert_eq!(Expr::tuple(vec![x.clone()]).to_string(), "(p.x,)");
        let cond = Expr::if_else(Expr::bool(true), Expr::null(), Expr::str("a"));
        assert_eq!(cond.ty(), Ty::string());
        assert_eq!(cond.to_string(), "if true then null else \"a\"");
    }
}
