//! TOML configuration.
//!
//! ```toml
//! [split]
//! match_mode = "exact"
//! cache_member_plans = true
//! carrier_param_name = "row"
//!
//! [join]
//! full_join = "anti_join"
//! null_keys_match = false
//! ```
//!
//! Every key is optional.

use std::path::Path;

use quarry_rewrite::SplitOptions;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::join::JoinOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub split: SplitOptions,
    pub join: JoinOptions,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::FullJoinStrategy;
    use quarry_rewrite::MatchMode;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            "[split]\nmatch_mode = \"exact\"\n\n[join]\nfull_join = \"union\"\n",
        )
        .unwrap();
        assert_eq!(config.split.match_mode, MatchMode::Exact);
        assert!(config.split.cache_member_plans);
        assert_eq!(config.split.carrier_param_name, "row");
        assert_eq!(config.join.full_join, FullJoinStrategy::Union);
        assert!(!config.join.null_keys_match);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[join]\nstrategy = \"union\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
