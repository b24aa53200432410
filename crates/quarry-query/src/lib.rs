//! Outer-join composition over quarry query sources.
//!
//! A [`QuerySource`] offers five primitives: correlate, flatten with
//! default, project, filter and union (plus concat). [`JoinExt`] builds
//! left, right and full outer joins out of them, and [`SplitExt`] lets
//! `select`/`where` take functions over the members of a composite row
//! instead of the row itself. Two sources are provided: the eager
//! [`Sequence`] and the lazy [`Plan`].

pub mod config;
pub mod context;
pub mod error;
pub mod join;
pub mod plan;
pub mod sequence;
pub mod source;
pub mod split;

pub use config::Config;
pub use context::{grouping_ty, join_row_ty, QueryContext, GROUPING, JOIN_ROW};
pub use error::{ConfigError, QueryError};
pub use join::{FullJoinStrategy, JoinExt, JoinOptions};
pub use plan::{Catalog, Plan, PlanNode};
pub use sequence::Sequence;
pub use source::QuerySource;
pub use split::SplitExt;
