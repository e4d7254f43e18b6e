use super::*;

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
}

#[test]
fn schema_from_row_skips_nulls() {
    let r = row(&[
        ("a", Value::Int(1)),
        ("b", Value::Null),
        ("c", Value::Str("x".into())),
    ]);
    let schema = Schema::from_row(&r);
    assert_eq!(schema.get("a"), Some(ColumnType::Int64));
    assert_eq!(schema.get("b"), None);
    assert_eq!(schema.get("c"), Some(ColumnType::Varchar));
}

#[test]
fn union_with_adds_new_columns() {
    let mut base = Schema::from_row(&row(&[("a", Value::Int(1))]));
    let incoming = Schema::from_row(&row(&[("b", Value::Float(1.5))]));
    base.union_with(&incoming).unwrap();
    assert_eq!(base.get("a"), Some(ColumnType::Int64));
    assert_eq!(base.get("b"), Some(ColumnType::Double));
}

#[test]
fn union_with_rejects_type_conflict() {
    let mut base = Schema::from_row(&row(&[("a", Value::Int(1))]));
    let incoming = Schema::from_row(&row(&[("a", Value::Str("oops".into()))]));
    let err = base.union_with(&incoming).unwrap_err();
    assert_eq!(
        err,
        SchemaError::Conflict {
            column: "a".into(),
            existing: ColumnType::Int64,
            new: ColumnType::Varchar,
        }
    );
}

#[test]
fn is_superset_of_detects_unchanged_schema() {
    let a = Schema::from_row(&row(&[("a", Value::Int(1)), ("b", Value::Bool(true))]));
    let b = Schema::from_row(&row(&[("a", Value::Int(1))]));
    assert!(a.is_superset_of(&b));
    assert!(!b.is_superset_of(&a));
}

#[test]
fn json_value_contributes_varchar() {
    let r = row(&[("nested", Value::Json(serde_json::json!({"k": "v"})))]);
    let schema = Schema::from_row(&r);
    assert_eq!(schema.get("nested"), Some(ColumnType::Varchar));
}
