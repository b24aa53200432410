//! The query-source abstraction the join layer composes over.

use std::sync::Arc;

use quarry_ast::{Lambda, Ty};
use quarry_rewrite::RewriteError;

use crate::context::{grouping_ty, join_row_ty, QueryContext, GROUPING};
use crate::error::QueryError;

/// A typed, composable source of elements.
///
/// Every operation validates its functions against [`element_ty`] when it
/// is composed, so type errors surface before any element is produced.
///
/// [`element_ty`]: QuerySource::element_ty
pub trait QuerySource: Clone + Sized {
    fn context(&self) -> &Arc<QueryContext>;

    fn element_ty(&self) -> &Ty;

    /// Pair every outer element with the (possibly empty) list of inner
    /// elements whose key equals its key. Yields `Grouping<O, I>` in outer
    /// order.
    fn correlate(self, inner: Self, outer_key: &Lambda, inner_key: &Lambda) -> Result<Self, QueryError>;

    /// `Grouping<O, I>` to `JoinRow<O, Option<I>>`: one row per group
    /// member, or a single row with a null inner when the group is empty.
    fn flatten_with_default(self) -> Result<Self, QueryError>;

    /// Map each element through a one-parameter `selector`.
    fn project(self, selector: &Lambda) -> Result<Self, QueryError>;

    /// Keep the elements for which `predicate` returns true.
    fn filter(self, predicate: &Lambda) -> Result<Self, QueryError>;

    /// Set union: elements of `self`, then elements of `other`, each
    /// distinct element once.
    fn union(self, other: Self) -> Result<Self, QueryError>;

    /// `self` followed by `other`, duplicates kept.
    fn concat(self, other: Self) -> Result<Self, QueryError>;
}

pub(crate) fn check_unary(op: &'static str, f: &Lambda, element: &Ty) -> Result<(), QueryError> {
    if f.arity() != 1 {
        return Err(RewriteError::ArityMismatch {
            expected: 1,
            found: f.arity(),
        }
        .into());
    }
    let expected = &f.params[0].ty;
    if !element.is_assignable_to(expected) {
        return Err(QueryError::SelectorInputMismatch {
            op,
            expected: expected.clone(),
            found: element.clone(),
        });
    }
    Ok(())
}

/// Element type of `outer.correlate(inner, ..)`.
pub(crate) fn correlated_ty(
    outer: &Ty,
    inner: &Ty,
    outer_key: &Lambda,
    inner_key: &Lambda,
) -> Result<Ty, QueryError> {
    check_unary("correlate", outer_key, outer)?;
    check_unary("correlate", inner_key, inner)?;
    let (ok, ik) = (outer_key.ret_ty(), inner_key.ret_ty());
    if ok.strip_option() != ik.strip_option() {
        return Err(QueryError::KeyTypeMismatch { outer: ok, inner: ik });
    }
    Ok(grouping_ty(outer.clone(), inner.clone()))
}

/// Element type of `flatten_with_default` over a source of `grouping`.
pub(crate) fn flattened_ty(grouping: &Ty) -> Result<Ty, QueryError> {
    match grouping.args() {
        [outer, inner] if grouping.con_name() == Some(GROUPING) => {
            Ok(join_row_ty(outer.clone(), Ty::option(inner.clone())))
        }
        _ => Err(QueryError::NotAGrouping(grouping.clone())),
    }
}

pub(crate) fn check_predicate(predicate: &Lambda, element: &Ty) -> Result<(), QueryError> {
    check_unary("filter", predicate, element)?;
    let ret = predicate.ret_ty();
    if *ret.strip_option() != Ty::bool() {
        return Err(QueryError::PredicateNotBool(ret));
    }
    Ok(())
}

pub(crate) fn check_same_elements(op: &'static str, left: &Ty, right: &Ty) -> Result<(), QueryError> {
    if left != right {
        return Err(QueryError::ElementTypeMismatch {
            op,
            left: left.clone(),
            right: right.clone(),
        });
    }
    Ok(())
}
