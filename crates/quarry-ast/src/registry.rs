//! Struct definitions and type introspection.
//!
//! The registry is the read-only introspection facility the rewriter matches
//! against. Fields are stored in a `Vec` in registration order and every
//! lookup reports them in that order; positional matching of same-typed
//! members depends on it.

use rustc_hash::FxHashMap;

use crate::error::AstError;
use crate::eval::{Record, Value};
use crate::expr::Expr;
use crate::ty::Ty;

/// A named, typed field of a struct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        FieldDef {
            name: name.into(),
            ty,
        }
    }
}

/// A struct definition. Generic parameters appear in field types as
/// `Ty::Con` with the parameter's name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub generic_params: Vec<String>,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        StructDef {
            name: name.into(),
            generic_params: Vec::new(),
            fields,
        }
    }

    pub fn generic(
        name: impl Into<String>,
        generic_params: Vec<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        StructDef {
            name: name.into(),
            generic_params,
            fields,
        }
    }
}

/// Registry of struct definitions, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    struct_defs: FxHashMap<String, StructDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a struct definition. Names and field names must be unique.
    pub fn register(&mut self, def: StructDef) -> Result<(), AstError> {
        if self.struct_defs.contains_key(&def.name) {
            return Err(AstError::DuplicateType(def.name));
        }
        for (i, field) in def.fields.iter().enumerate() {
            if def.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(AstError::DuplicateField {
                    name: def.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        self.struct_defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.struct_defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.struct_defs.contains_key(name)
    }

    /// The fields of `ty` in declaration order, with generic parameters
    /// instantiated from the type's arguments.
    pub fn members(&self, ty: &Ty) -> Result<Vec<FieldDef>, AstError> {
        let name: &str = match ty {
            Ty::Con(con) => con.name.as_str(),
            Ty::App(con, _) => match con.con_name() {
                Some(name) => name,
                None => return Err(AstError::NotAStruct(ty.clone())),
            },
            _ => return Err(AstError::NotAStruct(ty.clone())),
        };
        let def = match self.struct_defs.get(name) {
            Some(def) => def,
            None if matches!(name, "Int" | "String" | "Bool" | "Unit" | "Option" | "List") => {
                return Err(AstError::NotAStruct(ty.clone()))
            }
            None => return Err(AstError::UnknownType(ty.clone())),
        };
        let args = ty.args();
        if args.len() != def.generic_params.len() {
            return Err(AstError::GenericArity {
                name: def.name.clone(),
                expected: def.generic_params.len(),
                found: args.len(),
            });
        }
        Ok(def
            .fields
            .iter()
            .map(|f| FieldDef {
                name: f.name.clone(),
                ty: f.ty.instantiate(&def.generic_params, args),
            })
            .collect())
    }

    /// Build `object.member`, typed from the object's struct definition.
    pub fn member_access(&self, object: Expr, member: &str) -> Result<Expr, AstError> {
        let object_ty = object.ty();
        let field = self
            .members(&object_ty)?
            .into_iter()
            .find(|f| f.name == member)
            .ok_or_else(|| AstError::NoSuchMember {
                ty: object_ty.clone(),
                member: member.to_string(),
            })?;
        Ok(Expr::member(object, field.name, field.ty))
    }

    /// Build a record value of type `ty` from values given in field order.
    pub fn record(&self, ty: &Ty, values: Vec<Value>) -> Result<Value, AstError> {
        let fields = self.members(ty)?;
        if fields.len() != values.len() {
            return Err(AstError::RecordArity {
                ty: ty.clone(),
                expected: fields.len(),
                found: values.len(),
            });
        }
        let name = ty.con_name().unwrap_or_default().to_string();
        Ok(Value::Record(Record::new(
            name,
            fields.into_iter().map(|f| f.name).zip(values).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Param;
    use crate::ty::TyCon;

    fn pair_registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register(StructDef::generic(
            "Pair",
            vec!["A".into(), "B".into()],
            vec![
                FieldDef::new("first", Ty::Con(TyCon::new("A"))),
                FieldDef::new("second", Ty::Con(TyCon::new("B"))),
            ],
        ))
        .unwrap();
        reg
    }

    #[test]
    fn members_keep_declaration_order() {
        let mut reg = TypeRegistry::new();
        reg.register(StructDef::new(
            "Wide",
            vec![
                FieldDef::new("z", Ty::int()),
                FieldDef::new("a", Ty::string()),
                FieldDef::new("m", Ty::int()),
            ],
        ))
        .unwrap();
        let names: Vec<String> = reg
            .members(&Ty::struct_ty("Wide", vec![]))
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn generic_members_are_instantiated() {
        let reg = pair_registry();
        let ty = Ty::struct_ty("Pair", vec![Ty::int(), Ty::string()]);
        let fields = reg.members(&ty).unwrap();
        assert_eq!(fields[0], FieldDef::new("first", Ty::int()));
        assert_eq!(fields[1], FieldDef::new("second", Ty::string()));

        let err = reg.members(&Ty::struct_ty("Pair", vec![Ty::int()])).unwrap_err();
        assert!(matches!(err, AstError::GenericArity { expected: 2, found: 1, .. }));
    }

    #[test]
    fn member_access_is_typed() {
        let reg = pair_registry();
        let p = Param::new("p", Ty::struct_ty("Pair", vec![Ty::bool(), Ty::int()]));
        let access = reg.member_access(Expr::param(&p), "second").unwrap();
        assert_eq!(access.ty(), Ty::int());
        assert_eq!(access.to_string(), "p.second");
        assert!(matches!(
            reg.member_access(Expr::param(&p), "third"),
            Err(AstError::NoSuchMember { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_non_structs() {
        let mut reg = pair_registry();
        let dup = StructDef::new("Pair", vec![]);
        assert_eq!(reg.register(dup), Err(AstError::DuplicateType("Pair".into())));
        let bad = StructDef::new(
            "Twice",
            vec![FieldDef::new("x", Ty::int()), FieldDef::new("x", Ty::int())],
        );
        assert!(matches!(reg.register(bad), Err(AstError::DuplicateField { .. })));
        assert_eq!(reg.members(&Ty::int()), Err(AstError::NotAStruct(Ty::int())));
        let opt = Ty::option(Ty::int());
        assert_eq!(reg.members(&opt), Err(AstError::NotAStruct(opt.clone())));
        assert!(matches!(
            reg.members(&Ty::struct_ty("Missing", vec![])),
            Err(AstError::UnknownType(_))
        ));
    }

    #[test]
    fn record_checks_arity() {
        let reg = pair_registry();
        let ty = Ty::struct_ty("Pair", vec![Ty::int(), Ty::int()]);
        let rec = reg.record(&ty, vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(rec.to_string(), "Pair { first: 1, second: 2 }");
        assert!(matches!(
            reg.record(&ty, vec![Value::Int(1)]),
            Err(AstError::RecordArity { expected: 2, found: 1, .. })
        ));
    }
}
