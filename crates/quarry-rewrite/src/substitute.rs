//! Parameter substitution.
//!
//! A structure-preserving copy of a tree in which parameter leaves found in
//! a lookup are replaced by their bound subtree. Everything else is rebuilt
//! through [`Expr::map_children`] unchanged and in the same order.

use quarry_ast::{Expr, Lambda, ParamId};
use rustc_hash::FxHashMap;

use crate::param_map::ParameterMap;

/// Replace every free reference to a parameter in `bindings` with its
/// bound expression.
///
/// A nested lambda that declares one of the bound identities shadows it for
/// its own body, where those references are left alone.
pub fn substitute(expr: &Expr, bindings: &FxHashMap<ParamId, Expr>) -> Expr {
    if bindings.is_empty() {
        return expr.clone();
    }
    match expr {
        Expr::Param(p) => bindings.get(&p.id).cloned().unwrap_or_else(|| expr.clone()),
        Expr::Lambda(lambda) if lambda.params.iter().any(|p| bindings.contains_key(&p.id)) => {
            let mut inner = bindings.clone();
            for p in &lambda.params {
                inner.remove(&p.id);
            }
            Expr::lambda(Lambda::new(lambda.params.clone(), substitute(&lambda.body, &inner)))
        }
        _ => expr.map_children(|child| substitute(child, bindings)),
    }
}

/// Turn `lambda` into a one-parameter function over the map's carrier.
pub fn rewrite(lambda: &Lambda, map: &ParameterMap) -> Lambda {
    let body = substitute(&lambda.body, &map.bindings());
    Lambda::new(vec![map.carrier_param().clone()], body)
}
