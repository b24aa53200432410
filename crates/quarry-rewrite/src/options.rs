//! Options controlling how parameters are matched to carrier members.

use serde::Deserialize;

/// How a carrier member's type must relate to a parameter's declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Member type must equal the parameter type.
    Exact,
    /// Member type must be assignable to the parameter type
    /// (see [`Ty::is_assignable_to`](quarry_ast::Ty::is_assignable_to)).
    #[default]
    Assignable,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitOptions {
    pub match_mode: MatchMode,
    /// Reuse member plans computed for the same carrier and parameter types.
    pub cache_member_plans: bool,
    /// Display name of the single parameter of a split lambda.
    pub carrier_param_name: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Assignable,
            cache_member_plans: true,
            carrier_param_name: "row".to_string(),
        }
    }
}

impl SplitOptions {
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_member_plans = false;
        self
    }
}
