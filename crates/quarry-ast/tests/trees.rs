//! Integration tests for expression construction, printing and serialization.

use quarry_ast::{BinOp, Builtin, Expr, FieldDef, Lambda, Param, StructDef, Ty, TyCon, TypeRegistry, Value};

// ── Helpers ────────────────────────────────────────────────────────────

fn employee_registry() -> TypeRegistry {
    let mut reg = TypeRegistry::new();
    reg.register(StructDef::new(
        "Department",
        vec![FieldDef::new("id", Ty::int()), FieldDef::new("name", Ty::string())],
    ))
    .unwrap();
    reg.register(StructDef::new(
        "Employee",
        vec![
            FieldDef::new("id", Ty::int()),
            FieldDef::new("name", Ty::string()),
            FieldDef::new("department_id", Ty::option(Ty::int())),
        ],
    ))
    .unwrap();
    reg
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_selector_prints_like_source() {
    let reg = employee_registry();
    let d = Param::new("d", Ty::struct_ty("Department", vec![]));
    let e = Param::new("e", Ty::option(Ty::struct_ty("Employee", vec![])));
    let d_name = reg.member_access(Expr::param(&d), "name").unwrap();
    let e_name = Expr::member(Expr::param(&e), "name", Ty::string());
    let body = Expr::tuple(vec![d_name, Expr::binary(BinOp::Coalesce, e_name, Expr::str("-"))]);
    let selector = Lambda::new(vec![d, e], body);
    insta::assert_snapshot!(selector.to_string(), @r#"|d: Department, e: Option<Employee>| (d.name, (e.name ?? "-"))"#);
    assert_eq!(
        selector.ret_ty(),
        Ty::Tuple(vec![Ty::string(), Ty::string()])
    );
}

#[test]
fn test_compiled_selector_over_records() {
    let reg = employee_registry();
    let e = Param::new("e", Ty::struct_ty("Employee", vec![]));
    let dept = reg.member_access(Expr::param(&e), "department_id").unwrap();
    let body = Expr::binary(
        BinOp::Add,
        reg.member_access(Expr::param(&e), "name").unwrap(),
        Expr::call(Builtin::ToString, vec![dept]),
    );
    let f = Lambda::new(vec![e], body).compile();

    let bob = reg
        .record(
            &Ty::struct_ty("Employee", vec![]),
            vec![Value::Int(1), "Bob".into(), Value::Int(7)],
        )
        .unwrap();
    let mike = reg
        .record(
            &Ty::struct_ty("Employee", vec![]),
            vec![Value::Int(2), "Mike".into(), Value::Null],
        )
        .unwrap();
    assert_eq!(f.call(&[bob]).unwrap(), Value::from("Bob7"));
    assert_eq!(f.call(&[mike]).unwrap(), Value::from("Mike"));
}

#[test]
fn test_lambda_serializes_with_param_identity() {
    let x = Param::new("x", Ty::int());
    let lambda = Lambda::new(
        vec![x.clone()],
        Expr::binary(BinOp::Mul, Expr::param(&x), Expr::int(2)),
    );
    let json = serde_json::to_value(&lambda).unwrap();
    assert_eq!(json["params"][0]["name"], "x");
    assert_eq!(json["params"][0]["id"], x.id.0);

    let back: Lambda = serde_json::from_value(json).unwrap();
    assert_eq!(back, lambda);
    assert_eq!(back.compile().call(&[Value::Int(21)]).unwrap(), Value::Int(42));
}

#[test]
fn test_generic_parameter_names_do_not_leak() {
    let mut reg = TypeRegistry::new();
    reg.register(StructDef::generic(
        "Boxed",
        vec!["T".into()],
        vec![FieldDef::new("items", Ty::list(Ty::Con(TyCon::new("T"))))],
    ))
    .unwrap();
    let fields = reg
        .members(&Ty::struct_ty("Boxed", vec![Ty::bool()]))
        .unwrap();
    assert_eq!(fields[0].ty.to_string(), "List<Bool>");
}
