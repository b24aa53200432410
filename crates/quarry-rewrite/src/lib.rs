//! Parameter splitting and switching for quarry expression trees.
//!
//! A data source that only accepts one-argument functions over a composite
//! row type can still be given multi-argument lambdas: [`Splitter::split`]
//! matches each parameter to a member of the row type and rewrites the body
//! so every parameter reference becomes a member access on one new
//! parameter. [`switch_parameters`] swaps the declared order of a
//! two-parameter lambda without touching its body.

pub mod cache;
pub mod error;
pub mod matcher;
pub mod options;
pub mod param_map;
pub mod substitute;
pub mod switch;

use std::sync::Arc;

use quarry_ast::{Lambda, Ty, TypeRegistry};
use tracing::debug;

pub use cache::{CacheStats, MemberPlanCache};
pub use error::RewriteError;
pub use matcher::{match_members, MemberPlan, MemberSlot};
pub use options::{MatchMode, SplitOptions};
pub use param_map::ParameterMap;
pub use substitute::{rewrite, substitute};
pub use switch::{permute_parameters, switch_parameters};

/// Shared rewriting context: the type registry, options and member-plan
/// cache. Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Splitter {
    registry: Arc<TypeRegistry>,
    options: SplitOptions,
    cache: MemberPlanCache,
}

impl Splitter {
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_options(Arc::new(registry), SplitOptions::default())
    }

    pub fn with_options(registry: Arc<TypeRegistry>, options: SplitOptions) -> Self {
        Splitter {
            registry,
            options,
            cache: MemberPlanCache::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Choose one member of `carrier` per type in `expected`.
    pub fn member_plan(&self, carrier: &Ty, expected: &[Ty]) -> Result<Arc<MemberPlan>, RewriteError> {
        let compute = || -> Result<MemberPlan, RewriteError> {
            let members = self.registry.members(carrier)?;
            let plan = match_members(carrier, &members, expected, self.options.match_mode)?;
            debug!(
                carrier = %carrier,
                members = ?plan.names().collect::<Vec<_>>(),
                "computed member plan"
            );
            Ok(plan)
        };
        if self.options.cache_member_plans {
            self.cache.get_or_try_insert(carrier, expected, compute)
        } else {
            compute().map(Arc::new)
        }
    }

    /// Build the parameter map of `lambda` against `carrier`.
    pub fn parameter_map(&self, lambda: &Lambda, carrier: &Ty) -> Result<ParameterMap, RewriteError> {
        ParameterMap::build(self, lambda, carrier)
    }

    /// Rewrite an N-parameter `lambda` into a one-parameter lambda over
    /// `carrier`.
    pub fn split(&self, lambda: &Lambda, carrier: &Ty) -> Result<Lambda, RewriteError> {
        let map = self.parameter_map(lambda, carrier)?;
        Ok(rewrite(lambda, &map))
    }
}
