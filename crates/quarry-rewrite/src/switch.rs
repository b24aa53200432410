//! Parameter reordering.
//!
//! Only the declared parameter list changes; the body is shared as-is, so
//! every reference still resolves to the same identity, now bound from a
//! different argument position.

use quarry_ast::Lambda;

use crate::error::RewriteError;

/// `|p1, p2| body` -> `|p2, p1| body`.
pub fn switch_parameters(lambda: &Lambda) -> Result<Lambda, RewriteError> {
    if lambda.arity() != 2 {
        return Err(RewriteError::ArityMismatch {
            expected: 2,
            found: lambda.arity(),
        });
    }
    permute_parameters(lambda, &[1, 0])
}

/// Declare `lambda`'s parameters in a new order: position `i` of the result
/// takes the original parameter at `order[i]`.
pub fn permute_parameters(lambda: &Lambda, order: &[usize]) -> Result<Lambda, RewriteError> {
    let arity = lambda.arity();
    let mut seen = vec![false; arity];
    let valid = order.len() == arity
        && order.iter().all(|&i| i < arity && !std::mem::replace(&mut seen[i], true));
    if !valid {
        return Err(RewriteError::InvalidPermutation {
            order: order.to_vec(),
            arity,
        });
    }
    let params = order.iter().map(|&i| lambda.params[i].clone()).collect();
    Ok(Lambda::new(params, lambda.body.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_ast::{Expr, Param, Ty};

    fn three() -> Lambda {
        let a = Param::new("a", Ty::int());
        let b = Param::new("b", Ty::string());
        let c = Param::new("c", Ty::bool());
        let body = Expr::tuple(vec![Expr::param(&a), Expr::param(&b), Expr::param(&c)]);
        Lambda::new(vec![a, b, c], body)
    }

    #[test]
    fn switch_requires_two_params() {
        assert_eq!(
            switch_parameters(&three()).unwrap_err(),
            RewriteError::ArityMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn permute_keeps_body() {
        let f = three();
        let g = permute_parameters(&f, &[2, 0, 1]).unwrap();
        assert_eq!(g.body, f.body);
        assert_eq!(g.to_string(), "|c: Bool, a: Int, b: String| (a, b, c)");
    }

    #[test]
    fn permute_rejects_non_permutations() {
        let f = three();
        let orders: [&[usize]; 3] = [&[0, 1], &[0, 0, 1], &[0, 1, 3]];
        for order in orders {
            assert!(matches!(
                permute_parameters(&f, order),
                Err(RewriteError::InvalidPermutation { .. })
            ));
        }
    }
}
