//! Reference evaluator for expression trees.
//!
//! [`Lambda::compile`] produces a [`CompiledFn`] that walks the tree on every
//! call. It exists so callers (and tests) can check that a rewritten tree
//! behaves like the original; nothing in the rewriter depends on it.
//!
//! Null is the absent sentinel. It propagates through member access and
//! integer arithmetic, renders as the empty string in string concatenation,
//! and compares equal only to itself.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::EvalError;
use crate::expr::{BinOp, Builtin, Expr, Lambda, Literal, ParamId, UnaryOp};

type Env = FxHashMap<ParamId, Value>;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Record(Record),
    Closure(Arc<Closure>),
}

/// A struct value. Fields keep their declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Record {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Record {
            name: name.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }
}

/// A nested lambda together with the parameters it captured.
#[derive(Debug)]
pub struct Closure {
    lambda: Lambda,
    env: Env,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Text used by `to_string` and string concatenation: strings unquoted,
    /// null as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Unit | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Tuple(items) | Value::List(items) => items.hash(state),
            Value::Record(r) => r.hash(state),
            Value::Closure(c) => (Arc::as_ptr(c) as usize).hash(state),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_values(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_values(f, items)?;
                write!(f, "]")
            }
            Value::Record(r) => write!(f, "{}", r),
            Value::Closure(c) => write!(f, "<closure/{}>", c.lambda.arity()),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", name, value)?;
        }
        write!(f, " }}")
    }
}

/// An invocable form of a [`Lambda`].
#[derive(Clone, Debug)]
pub struct CompiledFn {
    lambda: Arc<Lambda>,
}

impl Lambda {
    pub fn compile(&self) -> CompiledFn {
        CompiledFn {
            lambda: Arc::new(self.clone()),
        }
    }
}

impl CompiledFn {
    pub fn arity(&self) -> usize {
        self.lambda.arity()
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        apply(&self.lambda, &Env::default(), args)
    }
}

fn apply(lambda: &Lambda, captured: &Env, args: &[Value]) -> Result<Value, EvalError> {
    if lambda.params.len() != args.len() {
        return Err(EvalError::Arity {
            expected: lambda.params.len(),
            found: args.len(),
        });
    }
    let mut env = captured.clone();
    for (param, arg) in lambda.params.iter().zip(args) {
        env.insert(param.id, arg.clone());
    }
    eval(&lambda.body, &env)
}

fn mismatch(op: &'static str, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op,
        value: value.to_string(),
    }
}

fn eval(expr: &Expr, env: &Env) -> Result<Value, EvalError> {
    match expr {
        Expr::Param(p) => env
            .get(&p.id)
            .cloned()
            .ok_or_else(|| EvalError::UnboundParam(p.name.clone())),
        Expr::Lit(lit) => Ok(match lit {
            Literal::Unit => Value::Unit,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }),
        Expr::Member { object, name, .. } => match eval(object, env)? {
            Value::Null => Ok(Value::Null),
            Value::Record(r) => r
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::NoSuchField(name.clone())),
            other => Err(mismatch("member access", &other)),
        },
        Expr::Unary { op, operand, .. } => match (op, eval(operand, env)?) {
            (_, Value::Null) => Ok(Value::Null),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Neg, Value::Int(n)) => {
                n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("-"))
            }
            (op, other) => Err(mismatch(op.symbol(), &other)),
        },
        Expr::Binary { op, lhs, rhs, .. } => eval_binary(*op, lhs, rhs, env),
        Expr::Call { func, args, .. } => {
            let values = args
                .iter()
                .map(|a| eval(a, env))
                .collect::<Result<Vec<_>, _>>()?;
            eval_builtin(*func, &values)
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => match eval(cond, env)? {
            Value::Bool(true) => eval(then_branch, env),
            Value::Bool(false) | Value::Null => eval(else_branch, env),
            other => Err(mismatch("if", &other)),
        },
        Expr::Construct { ty, fields } => {
            let mut values = Vec::with_capacity(fields.len());
            for (name, value) in fields {
                values.push((name.clone(), eval(value, env)?));
            }
            Ok(Value::Record(Record::new(
                ty.con_name().unwrap_or_default(),
                values,
            )))
        }
        Expr::Tuple(elems) => Ok(Value::Tuple(
            elems.iter().map(|e| eval(e, env)).collect::<Result<_, _>>()?,
        )),
        Expr::List { elements, .. } => Ok(Value::List(
            elements
                .iter()
                .map(|e| eval(e, env))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Lambda(lambda) => Ok(Value::Closure(Arc::new(Closure {
            lambda: (**lambda).clone(),
            env: env.clone(),
        }))),
        Expr::Invoke { callee, args, .. } => {
            let callee = eval(callee, env)?;
            let values = args
                .iter()
                .map(|a| eval(a, env))
                .collect::<Result<Vec<_>, _>>()?;
            call_value(&callee, &values)
        }
    }
}

fn call_value(callee: &Value, args: &[Value]) -> Result<Value, EvalError> {
    match callee {
        Value::Closure(c) => apply(&c.lambda, &c.env, args),
        other => Err(EvalError::NotCallable(other.to_string())),
    }
}

fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, env: &Env) -> Result<Value, EvalError> {
    let left = eval(lhs, env)?;
    match op {
        BinOp::And | BinOp::Or => {
            let short = op == BinOp::Or;
            match left {
                Value::Bool(b) if b == short => return Ok(Value::Bool(b)),
                Value::Bool(_) => {}
                other => return Err(mismatch(op.symbol(), &other)),
            }
            return match eval(rhs, env)? {
                Value::Bool(b) => Ok(Value::Bool(b)),
                other => Err(mismatch(op.symbol(), &other)),
            };
        }
        BinOp::Coalesce => {
            return if left.is_null() { eval(rhs, env) } else { Ok(left) };
        }
        _ => {}
    }

    let right = eval(rhs, env)?;
    match op {
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::Ne => Ok(Value::Bool(left != right)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = match (&left, &right) {
                (Value::Null, _) | (_, Value::Null) => return Ok(Value::Bool(false)),
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                (other, _) => return Err(mismatch(op.symbol(), other)),
            };
            Ok(Value::Bool(match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            }))
        }
        BinOp::Add => match (&left, &right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", left.render(), right.render())))
            }
            _ => int_arith(op, &left, &right),
        },
        _ => int_arith(op, &left, &right),
    }
}

fn int_arith(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (a, b) = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => (*a, *b),
        (Value::Int(_), other) | (other, _) => return Err(mismatch(op.symbol(), other)),
    };
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div | BinOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
        BinOp::Div => a.checked_div(b),
        BinOp::Rem => a.checked_rem(b),
        _ => return Err(mismatch(op.symbol(), left)),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow(op.symbol()))
}

fn eval_builtin(func: Builtin, args: &[Value]) -> Result<Value, EvalError> {
    let expected = if func == Builtin::Any { 2 } else { 1 };
    if args.len() != expected {
        return Err(EvalError::Arity {
            expected,
            found: args.len(),
        });
    }
    match (func, &args[0]) {
        (Builtin::ToString, v) => Ok(Value::Str(v.render())),
        (Builtin::Len, Value::Str(s)) => Ok(Value::Int(s.chars().count() as i64)),
        (Builtin::Len, Value::List(items)) => Ok(Value::Int(items.len() as i64)),
        (Builtin::Len, Value::Null) => Ok(Value::Null),
        (Builtin::IsEmpty, Value::List(items)) => Ok(Value::Bool(items.is_empty())),
        (Builtin::IsEmpty, Value::Null) => Ok(Value::Bool(true)),
        (Builtin::Any, Value::List(items)) => {
            for item in items {
                match call_value(&args[1], std::slice::from_ref(item))? {
                    Value::Bool(true) => return Ok(Value::Bool(true)),
                    Value::Bool(false) | Value::Null => {}
                    other => return Err(mismatch("any", &other)),
                }
            }
            Ok(Value::Bool(false))
        }
        (Builtin::Any, Value::Null) => Ok(Value::Bool(false)),
        (func, other) => Err(mismatch(func.name(), other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Param;
    use crate::ty::Ty;

    #[test]
    fn string_plus_int_concatenates() {
        let i = Param::new("i", Ty::int());
        let s = Param::new("s", Ty::string());
        let f = Lambda::new(
            vec![i.clone(), s.clone()],
            Expr::binary(BinOp::Add, Expr::param(&s), Expr::param(&i)),
        )
        .compile();
        assert_eq!(f.call(&[Value::Int(2), "5".into()]), Ok("52".into()));
    }

    #[test]
    fn null_propagates_through_members_and_arith() {
        let p = Param::new("p", Ty::option(Ty::struct_ty("Point", vec![])));
        let x = Expr::member(Expr::param(&p), "x", Ty::int());
        let f = Lambda::new(vec![p], Expr::binary(BinOp::Add, x, Expr::int(1))).compile();
        assert_eq!(f.call(&[Value::Null]), Ok(Value::Null));
        let point = Value::Record(Record::new("Point", vec![("x".into(), Value::Int(4))]));
        assert_eq!(f.call(&[point]), Ok(Value::Int(5)));
    }

    #[test]
    fn any_calls_nested_lambda() {
        let xs = Param::new("xs", Ty::list(Ty::int()));
        let limit = Param::new("limit", Ty::int());
        let x = Param::new("x", Ty::int());
        let pred = Lambda::new(
            vec![x.clone()],
            Expr::binary(BinOp::Gt, Expr::param(&x), Expr::param(&limit)),
        );
        let f = Lambda::new(
            vec![xs.clone(), limit],
            Expr::call(Builtin::Any, vec![Expr::param(&xs), Expr::lambda(pred)]),
        )
        .compile();
        let list = Value::List(vec![Value::Int(1), Value::Int(7)]);
        assert_eq!(f.call(&[list.clone(), Value::Int(5)]), Ok(Value::Bool(true)));
        assert_eq!(f.call(&[list, Value::Int(9)]), Ok(Value::Bool(false)));
    }

    #[test]
    fn arithmetic_errors_are_reported() {
        let a = Param::new("a", Ty::int());
        let div = Lambda::new(
            vec![a.clone()],
            Expr::binary(BinOp::Div, Expr::int(10), Expr::param(&a)),
        )
        .compile();
        assert_eq!(div.call(&[Value::Int(0)]), Err(EvalError::DivisionByZero));
        assert_eq!(div.call(&[Value::Int(3)]), Ok(Value::Int(3)));
        assert_eq!(
            div.call(&[]),
            Err(EvalError::Arity {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn coalesce_and_short_circuit() {
        let a = Param::new("a", Ty::option(Ty::int()));
        let f = Lambda::new(
            vec![a.clone()],
            Expr::binary(BinOp::Coalesce, Expr::param(&a), Expr::int(-1)),
        )
        .compile();
        assert_eq!(f.call(&[Value::Null]), Ok(Value::Int(-1)));
        assert_eq!(f.call(&[Value::Int(3)]), Ok(Value::Int(3)));

        // The right side would fail with a type mismatch if it were evaluated.
        let g = Lambda::new(
            vec![],
            Expr::binary(BinOp::Or, Expr::bool(true), Expr::int(1)),
        )
        .compile();
        assert_eq!(g.call(&[]), Ok(Value::Bool(true)));
    }
}
