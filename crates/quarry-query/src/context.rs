//! Shared query context and the builtin join carrier types.

use std::sync::Arc;

use quarry_ast::{FieldDef, Record, StructDef, Ty, TyCon, TypeRegistry, Value};
use quarry_rewrite::Splitter;

use crate::config::Config;
use crate::error::QueryError;
use crate::join::JoinOptions;

/// `Grouping<O, I> { outer: O, group: List<I> }`: one outer element with
/// the inner elements whose key matched it.
pub const GROUPING: &str = "Grouping";
/// `JoinRow<O, I> { outer: O, inner: I }`: one flattened join row.
pub const JOIN_ROW: &str = "JoinRow";

pub const OUTER_FIELD: &str = "outer";
pub const GROUP_FIELD: &str = "group";
pub const INNER_FIELD: &str = "inner";

pub fn grouping_ty(outer: Ty, inner: Ty) -> Ty {
    Ty::struct_ty(GROUPING, vec![outer, inner])
}

pub fn join_row_ty(outer: Ty, inner: Ty) -> Ty {
    Ty::struct_ty(JOIN_ROW, vec![outer, inner])
}

pub(crate) fn grouping_value(outer: Value, group: Vec<Value>) -> Value {
    Value::Record(Record::new(
        GROUPING,
        vec![
            (OUTER_FIELD.to_string(), outer),
            (GROUP_FIELD.to_string(), Value::List(group)),
        ],
    ))
}

pub(crate) fn join_row_value(outer: Value, inner: Value) -> Value {
    Value::Record(Record::new(
        JOIN_ROW,
        vec![
            (OUTER_FIELD.to_string(), outer),
            (INNER_FIELD.to_string(), inner),
        ],
    ))
}

fn builtin_carriers() -> [StructDef; 2] {
    let o = || Ty::Con(TyCon::new("O"));
    let i = || Ty::Con(TyCon::new("I"));
    [
        StructDef::generic(
            GROUPING,
            vec!["O".into(), "I".into()],
            vec![
                FieldDef::new(OUTER_FIELD, o()),
                FieldDef::new(GROUP_FIELD, Ty::list(i())),
            ],
        ),
        StructDef::generic(
            JOIN_ROW,
            vec!["O".into(), "I".into()],
            vec![FieldDef::new(OUTER_FIELD, o()), FieldDef::new(INNER_FIELD, i())],
        ),
    ]
}

/// Everything a query source needs at composition time: the splitter
/// (registry, options, member-plan cache) and the join options.
#[derive(Debug)]
pub struct QueryContext {
    splitter: Splitter,
    join: JoinOptions,
}

impl QueryContext {
    pub fn new(registry: TypeRegistry) -> Result<Arc<Self>, QueryError> {
        Self::with_config(registry, Config::default())
    }

    /// Register the join carriers in `registry` and freeze it.
    pub fn with_config(mut registry: TypeRegistry, config: Config) -> Result<Arc<Self>, QueryError> {
        for def in builtin_carriers() {
            registry.register(def)?;
        }
        Ok(Arc::new(QueryContext {
            splitter: Splitter::with_options(Arc::new(registry), config.split),
            join: config.join,
        }))
    }

    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.splitter.registry()
    }

    pub fn join_options(&self) -> &JoinOptions {
        &self.join
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_ast::AstError;

    #[test]
    fn join_carriers_are_registered() {
        let ctx = QueryContext::new(TypeRegistry::new()).unwrap();
        let fields = ctx
            .registry()
            .members(&join_row_ty(Ty::int(), Ty::option(Ty::string())))
            .unwrap();
        assert_eq!(fields[0], FieldDef::new("outer", Ty::int()));
        assert_eq!(fields[1], FieldDef::new("inner", Ty::option(Ty::string())));
        let group = ctx
            .registry()
            .members(&grouping_ty(Ty::int(), Ty::bool()))
            .unwrap();
        assert_eq!(group[1].ty, Ty::list(Ty::bool()));
    }

    #[test]
    fn clashing_user_type_is_rejected() {
        let mut reg = TypeRegistry::new();
        reg.register(StructDef::new(JOIN_ROW, vec![])).unwrap();
        assert_eq!(
            QueryContext::new(reg).unwrap_err(),
            QueryError::Ast(AstError::DuplicateType(JOIN_ROW.into()))
        );
    }
}
