//! `select` and `where` that accept multi-parameter functions.

use quarry_ast::Lambda;
use tracing::trace;

use crate::error::QueryError;
use crate::source::QuerySource;

/// Projection and filtering whose function parameters are matched to the
/// members of the source's composite element type.
///
/// A one-parameter function that already accepts the element is used as
/// is. Anything else is split against the element type, so
/// `|d: Department, e: Option<Employee>| ..` over
/// `JoinRow<Department, Option<Employee>>` reads `row.outer` and
/// `row.inner`.
pub trait SplitExt: QuerySource {
    fn select_split(self, selector: &Lambda) -> Result<Self, QueryError> {
        let selector = split_against(&self, selector)?;
        self.project(&selector)
    }

    fn where_split(self, predicate: &Lambda) -> Result<Self, QueryError> {
        let predicate = split_against(&self, predicate)?;
        self.filter(&predicate)
    }
}

impl<S: QuerySource> SplitExt for S {}

fn split_against<S: QuerySource>(source: &S, f: &Lambda) -> Result<Lambda, QueryError> {
    let element = source.element_ty();
    if f.arity() == 1 && element.is_assignable_to(&f.params[0].ty) {
        return Ok(f.clone());
    }
    let split = source.context().splitter().split(f, element)?;
    trace!(original = %f, split = %split, "split parameters");
    Ok(split)
}
