//! Generic traversal over expression trees.
//!
//! [`Expr::map_children`] rebuilds one level of a node from transformed
//! children; transforms recurse by calling it from their own match arms and
//! only special-case the node kinds they care about.

use crate::expr::{Expr, Lambda, Param, ParamId};

impl Expr {
    /// Rebuild this node with every direct child replaced by `f(child)`.
    ///
    /// Leaves (`Param`, `Lit`) are cloned. For `Lambda` nodes the body is the
    /// only child; declared parameters are kept as they are. Children are
    /// visited in evaluation order.
    pub fn map_children(&self, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
        match self {
            Expr::Param(_) | Expr::Lit(_) => self.clone(),
            Expr::Member { object, name, ty } => Expr::Member {
                object: Box::new(f(object)),
                name: name.clone(),
                ty: ty.clone(),
            },
            Expr::Unary { op, operand, ty } => Expr::Unary {
                op: *op,
                operand: Box::new(f(operand)),
                ty: ty.clone(),
            },
            Expr::Binary { op, lhs, rhs, ty } => {
                let lhs = f(lhs);
                let rhs = f(rhs);
                Expr::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    ty: ty.clone(),
                }
            }
            Expr::Call { func, args, ty } => Expr::Call {
                func: *func,
                args: args.iter().map(&mut f).collect(),
                ty: ty.clone(),
            },
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ty,
            } => {
                let cond = f(cond);
                let then_branch = f(then_branch);
                let else_branch = f(else_branch);
                Expr::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                    ty: ty.clone(),
                }
            }
            Expr::Construct { ty, fields } => Expr::Construct {
                ty: ty.clone(),
                fields: fields
                    .iter()
                    .map(|(name, value)| (name.clone(), f(value)))
                    .collect(),
            },
            Expr::Tuple(elems) => Expr::Tuple(elems.iter().map(&mut f).collect()),
            Expr::List { elem_ty, elements } => Expr::List {
                elem_ty: elem_ty.clone(),
                elements: elements.iter().map(&mut f).collect(),
            },
            Expr::Lambda(lambda) => Expr::Lambda(Box::new(Lambda {
                params: lambda.params.clone(),
                body: f(&lambda.body),
            })),
            Expr::Invoke { callee, args, ty } => {
                let callee = f(callee);
                Expr::Invoke {
                    callee: Box::new(callee),
                    args: args.iter().map(&mut f).collect(),
                    ty: ty.clone(),
                }
            }
        }
    }

    /// Visit every direct child in evaluation order.
    pub fn for_each_child<'a>(&'a self, mut f: impl FnMut(&'a Expr)) {
        match self {
            Expr::Param(_) | Expr::Lit(_) => {}
            Expr::Member { object, .. } => f(object),
            Expr::Unary { operand, .. } => f(operand),
            Expr::Binary { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Expr::Call { args, .. } => args.iter().for_each(f),
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                f(cond);
                f(then_branch);
                f(else_branch);
            }
            Expr::Construct { fields, .. } => fields.iter().for_each(|(_, v)| f(v)),
            Expr::Tuple(elems) => elems.iter().for_each(f),
            Expr::List { elements, .. } => elements.iter().for_each(f),
            Expr::Lambda(lambda) => f(&lambda.body),
            Expr::Invoke { callee, args, .. } => {
                f(callee);
                args.iter().for_each(f);
            }
        }
    }
}

/// Parameters referenced freely in `expr`, once each, in order of first
/// reference.
///
/// References to parameters declared by a nested lambda inside `expr` are
/// bound there and not reported.
pub fn referenced_params(expr: &Expr) -> Vec<&Param> {
    let mut refs = Vec::new();
    let mut bound = Vec::new();
    collect_refs(expr, &mut bound, &mut refs);
    refs
}

fn collect_refs<'a>(expr: &'a Expr, bound: &mut Vec<ParamId>, refs: &mut Vec<&'a Param>) {
    match expr {
        Expr::Param(p) => {
            if !bound.contains(&p.id) && !refs.iter().any(|r| r.id == p.id) {
                refs.push(p);
            }
        }
        Expr::Lambda(lambda) => {
            let depth = bound.len();
            bound.extend(lambda.params.iter().map(|p| p.id));
            collect_refs(&lambda.body, bound, refs);
            bound.truncate(depth);
        }
        _ => expr.for_each_child(|child| collect_refs(child, bound, refs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinOp, Builtin};
    use crate::ty::Ty;

    #[test]
    fn map_children_rebuilds_one_level() {
        let a = Param::new("a", Ty::int());
        let e = Expr::binary(BinOp::Mul, Expr::param(&a), Expr::int(3));
        let doubled = e.map_children(|c| Expr::binary(BinOp::Add, c.clone(), c.clone()));
        assert_eq!(doubled.to_string(), "((a + a) * (3 + 3))");
        assert_eq!(doubled.ty(), Ty::int());
    }

    #[test]
    fn referenced_params_skips_nested_bindings() {
        let xs = Param::new("xs", Ty::list(Ty::int()));
        let limit = Param::new("limit", Ty::int());
        let x = Param::new("x", Ty::int());
        let pred = Lambda::new(
            vec![x.clone()],
            Expr::binary(BinOp::Gt, Expr::param(&x), Expr::param(&limit)),
        );
        let body = Expr::call(Builtin::Any, vec![Expr::param(&xs), Expr::lambda(pred)]);
        let refs: Vec<&str> = referenced_params(&body)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(refs, ["xs", "limit"]);
    }
}
