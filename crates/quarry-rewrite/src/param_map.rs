//! Binding of original parameters to carrier accessor paths.

use quarry_ast::{referenced_params, Expr, Lambda, Param, ParamId, Ty};
use rustc_hash::FxHashMap;

use crate::error::RewriteError;
use crate::Splitter;

/// Total mapping from a lambda's parameters to `carrier.member` accessors.
///
/// Every accessor is rooted at the same freshly declared carrier parameter.
/// Entries keep the lambda's parameter order; no two entries name the same
/// member.
#[derive(Clone, Debug)]
pub struct ParameterMap {
    carrier_param: Param,
    entries: Vec<(Param, Expr)>,
    index: FxHashMap<ParamId, usize>,
}

impl ParameterMap {
    /// Match `lambda`'s parameter types against the members of `carrier`
    /// and bind each parameter to its member.
    pub fn build(splitter: &Splitter, lambda: &Lambda, carrier: &Ty) -> Result<Self, RewriteError> {
        if lambda.params.is_empty() {
            return Err(RewriteError::EmptyParameterList);
        }
        let mut index = FxHashMap::default();
        for (pos, param) in lambda.params.iter().enumerate() {
            if index.insert(param.id, pos).is_some() {
                return Err(RewriteError::DuplicateParameter(param.name.clone()));
            }
        }
        if let Some(free) = referenced_params(&lambda.body)
            .into_iter()
            .find(|p| !index.contains_key(&p.id))
        {
            return Err(RewriteError::UndeclaredParameter(free.name.clone()));
        }

        let plan = splitter.member_plan(carrier, &lambda.param_types())?;
        let carrier_param = Param::new(splitter.options().carrier_param_name.clone(), carrier.clone());
        let entries = lambda
            .params
            .iter()
            .zip(&plan.slots)
            .map(|(param, slot)| {
                // The member may be `T` for a parameter declared `Option<T>`;
                // the accessor keeps the declared type so the body still
                // types the same.
                let access = Expr::member(Expr::param(&carrier_param), slot.name.clone(), param.ty.clone());
                (param.clone(), access)
            })
            .collect();

        Ok(ParameterMap {
            carrier_param,
            entries,
            index,
        })
    }

    /// The single parameter of the rewritten lambda.
    pub fn carrier_param(&self) -> &Param {
        &self.carrier_param
    }

    /// The accessor bound to parameter `id`, if it is one of the originals.
    pub fn get(&self, id: ParamId) -> Option<&Expr> {
        self.index.get(&id).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(original parameter, accessor)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (&Param, &Expr)> {
        self.entries.iter().map(|(p, e)| (p, e))
    }

    /// The lookup the substitution walk consumes.
    pub fn bindings(&self) -> FxHashMap<ParamId, Expr> {
        self.entries
            .iter()
            .map(|(p, e)| (p.id, e.clone()))
            .collect()
    }
}
