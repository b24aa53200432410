//! Outer joins composed from the source primitives.
//!
//! Each join takes an outer and an inner source, one key function per side
//! and a two-parameter result selector `(outer, inner) -> R`:
//!
//! * left: `outer.correlate(inner).flatten_with_default().select_split(selector)`.
//!   Every outer element appears at least once; unmatched ones see a null
//!   inner.
//! * right: the same pipeline with the roles swapped and the selector's
//!   parameters switched so it can be fed `JoinRow<inner, Option<outer>>`.
//! * full: left rows followed by the inner elements the left join missed,
//!   or the set union of left and right, see [`FullJoinStrategy`].
//!
//! The side that may be missing is optional in the selector: `(O, Option<I>)`
//! for left joins, `(Option<O>, I)` for right joins and
//! `(Option<O>, Option<I>)` for full joins.

use quarry_ast::{Builtin, Expr, Lambda, Param};
use quarry_rewrite::{switch_parameters, RewriteError};
use serde::Deserialize;
use tracing::debug;

use crate::context::GROUP_FIELD;
use crate::error::QueryError;
use crate::source::QuerySource;
use crate::split::SplitExt;

/// How `full_outer_join` assembles its rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullJoinStrategy {
    /// Left join rows, then one row per inner element with no outer match.
    /// Duplicate rows produced by the selector are kept.
    #[default]
    AntiJoin,
    /// Set union of the left and right join rows.
    Union,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinOptions {
    pub full_join: FullJoinStrategy,
    /// Whether a null key on one side matches a null key on the other.
    pub null_keys_match: bool,
}

fn check_selector(selector: &Lambda) -> Result<(), QueryError> {
    if selector.arity() != 2 {
        return Err(RewriteError::ArityMismatch {
            expected: 2,
            found: selector.arity(),
        }
        .into());
    }
    Ok(())
}

/// `|g: Grouping<O, I>| is_empty(g.group)`
fn empty_group<S: QuerySource>(source: &S) -> Result<Lambda, QueryError> {
    let g = Param::new("g", source.element_ty().clone());
    let group = source
        .context()
        .registry()
        .member_access(Expr::param(&g), GROUP_FIELD)?;
    Ok(Lambda::new(vec![g], Expr::call(Builtin::IsEmpty, vec![group])))
}

pub trait JoinExt: QuerySource {
    fn left_outer_join(
        self,
        inner: Self,
        outer_key: &Lambda,
        inner_key: &Lambda,
        selector: &Lambda,
    ) -> Result<Self, QueryError> {
        check_selector(selector)?;
        debug!(outer = %self.element_ty(), inner = %inner.element_ty(), "left outer join");
        self.correlate(inner, outer_key, inner_key)?
            .flatten_with_default()?
            .select_split(selector)
    }

    #[deprecated(note = "renamed to `left_outer_join`")]
    fn outer_join(
        self,
        inner: Self,
        outer_key: &Lambda,
        inner_key: &Lambda,
        selector: &Lambda,
    ) -> Result<Self, QueryError> {
        self.left_outer_join(inner, outer_key, inner_key, selector)
    }

    fn right_outer_join(
        self,
        inner: Self,
        outer_key: &Lambda,
        inner_key: &Lambda,
        selector: &Lambda,
    ) -> Result<Self, QueryError> {
        let switched = switch_parameters(selector)?;
        debug!(outer = %self.element_ty(), inner = %inner.element_ty(), "right outer join");
        inner
            .correlate(self, inner_key, outer_key)?
            .flatten_with_default()?
            .select_split(&switched)
    }

    fn full_outer_join(
        self,
        inner: Self,
        outer_key: &Lambda,
        inner_key: &Lambda,
        selector: &Lambda,
    ) -> Result<Self, QueryError> {
        let strategy = self.context().join_options().full_join;
        debug!(
            outer = %self.element_ty(),
            inner = %inner.element_ty(),
            ?strategy,
            "full outer join"
        );
        match strategy {
            FullJoinStrategy::AntiJoin => {
                let switched = switch_parameters(selector)?;
                let left = self
                    .clone()
                    .left_outer_join(inner.clone(), outer_key, inner_key, selector)?;
                let mirrored = inner.correlate(self, inner_key, outer_key)?;
                let unmatched = empty_group(&mirrored)?;
                let right = mirrored
                    .filter(&unmatched)?
                    .flatten_with_default()?
                    .select_split(&switched)?;
                left.concat(right)
            }
            FullJoinStrategy::Union => {
                let left = self
                    .clone()
                    .left_outer_join(inner.clone(), outer_key, inner_key, selector)?;
                let right = self.right_outer_join(inner, outer_key, inner_key, selector)?;
                left.union(right)
            }
        }
    }
}

impl<S: QuerySource> JoinExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryContext;
    use crate::sequence::Sequence;
    use quarry_ast::{Ty, TypeRegistry, Value};

    fn ints(ctx: &std::sync::Arc<QueryContext>, xs: &[i64]) -> Sequence {
        Sequence::new(ctx, Ty::int(), xs.iter().map(|&x| Value::Int(x)).collect())
    }

    fn identity() -> Lambda {
        let x = Param::new("x", Ty::int());
        Lambda::new(vec![x.clone()], Expr::param(&x))
    }

    #[test]
    fn selector_must_take_two_parameters() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let err = ints(&ctx, &[1])
            .left_outer_join(ints(&ctx, &[1]), &identity(), &identity(), &identity())
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::Rewrite(RewriteError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn empty_group_predicate_reads_the_group_member() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let grouped = ints(&ctx, &[1, 2])
            .correlate(ints(&ctx, &[2]), &identity(), &identity())
            .unwrap();
        let pred = empty_group(&grouped).unwrap();
        insta::assert_snapshot!(pred.to_string(), @"|g: Grouping<Int, Int>| is_empty(g.group)");
        let kept = grouped.filter(&pred).unwrap();
        assert_eq!(kept.len(), 1);
    }
}
