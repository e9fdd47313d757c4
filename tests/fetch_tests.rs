use jse_lang::{
    Error, EvaluationContext, FetchScript, FunctionRegistry, LinkedContext, Value, VariablePath,
    convert::value_to_json,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn rows(token: serde_json::Value) -> Vec<Value> {
    match Value::from(token) {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn owners() -> Vec<Value> {
    rows(json!([{"id": 1, "name": "ann"}, {"id": 2, "name": "bob"}, {"id": 3, "name": "cy"}]))
}

fn pets() -> Vec<Value> {
    rows(json!([
        {"ownerId": 1, "name": "rex", "address": {"city": "oslo", "zip": "0150"}},
        {"ownerId": 2, "name": "tom", "address": {"city": "bergen", "zip": "5003"}},
        {"ownerId": 1, "name": "kit", "address": {"city": "oslo", "zip": "0151"}}
    ]))
}

fn as_json(values: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(values.iter().map(value_to_json).collect())
}

#[test]
fn test_linked_context_namespaces() {
    let functions = FunctionRegistry::new();
    let params = Value::from(json!({"limit": 10}));
    let parent = Value::from(json!({"id": 1}));
    let fetched = Value::from(json!({"ownerId": 1}));
    let ctx = LinkedContext::new(&params, &functions).link(&parent, Some(&fetched));

    let resolve = |name: &str| ctx.resolve_variable_value(&VariablePath::parse(name, '.').unwrap());
    assert_eq!(resolve("r.id"), Value::Integer(1));
    assert_eq!(resolve("fr.ownerId"), Value::Integer(1));
    assert_eq!(resolve("p.limit"), Value::Integer(10));
    assert_eq!(resolve("limit"), Value::Integer(10));
    assert_eq!(resolve("r.missing"), Value::Null);

    let unlinked = LinkedContext::new(&params, &functions);
    assert_eq!(
        unlinked.resolve_variable_value(&VariablePath::parse("r.id", '.').unwrap()),
        Value::Null
    );
}

#[test]
fn test_whole_script_is_the_filter() {
    let script = FetchScript::parse(r#"{"$eq": ["@r.id", "@fr.ownerId"]}"#).unwrap();
    assert!(script.filter().is_some());
    assert!(script.projection().is_none());
}

#[test]
fn test_script_with_filter_and_projection() {
    let script = FetchScript::parse(
        r#"{"filter": {"$eq": ["@r.id", "@fr.ownerId"]},
            "projection": {"name": true, "address.city": 1, "address.zip": false}}"#,
    )
    .unwrap();
    assert!(script.filter().is_some());
    assert_eq!(
        script.projection().unwrap(),
        [
            vec!["name".to_string()],
            vec!["address".to_string(), "city".to_string()]
        ]
    );
}

#[test]
fn test_projection_only_script() {
    let script = FetchScript::parse(r#"{"projection": {"name": "true"}}"#).unwrap();
    assert!(script.filter().is_none());
    assert_eq!(script.projection().unwrap().len(), 1);
}

#[test]
fn test_invalid_projections() {
    assert!(matches!(
        FetchScript::parse(r#"{"projection": ["name"]}"#),
        Err(Error::Script(_))
    ));
    assert!(matches!(
        FetchScript::parse(r#"{"projection": {"name": false}}"#),
        Err(Error::Script(_))
    ));
}

#[test]
fn test_invalid_filter_is_a_structural_error() {
    assert!(matches!(
        FetchScript::parse(r#"{"filter": {"$between": ["@r.id", 1]}}"#),
        Err(Error::Structural(_))
    ));
    assert!(matches!(FetchScript::parse("not json"), Err(Error::Json(_))));
}

#[test]
fn test_predicate() {
    let functions = FunctionRegistry::new();
    let params = Value::from(json!({"min": 2}));
    let script = FetchScript::parse(r#"{"$gte": ["@r.id", "@p.min"]}"#).unwrap();

    let owners = owners();
    let decisions: Vec<bool> = owners
        .iter()
        .map(|row| script.predicate(row, &params, &functions).unwrap())
        .collect();
    assert_eq!(decisions, [false, true, true]);

    let always = FetchScript::parse(r#"{"projection": {"name": true}}"#).unwrap();
    assert!(always.predicate(&owners[0], &params, &functions).unwrap());
}

#[test]
fn test_inject_multiple_records() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(r#"{"$eq": ["@r.id", "@fr.ownerId"]}"#).unwrap();
    let mut parents = owners();
    script
        .inject(&mut parents, &pets(), &Value::Null, &functions, true, "pets")
        .unwrap();

    let names = |parent: &Value| -> Vec<String> {
        match parent.lookup(&["pets"]) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|p| p.lookup(&["name"]).map(Value::as_string).unwrap_or_default())
                .collect(),
            other => panic!("expected injected list, got {:?}", other),
        }
    };
    assert_eq!(names(&parents[0]), ["rex", "kit"]);
    assert_eq!(names(&parents[1]), ["tom"]);
    assert!(names(&parents[2]).is_empty());
}

#[test]
fn test_inject_single_record() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(
        r#"{"filter": {"$eq": ["@r.id", "@fr.ownerId"]}, "projection": {"name": true}}"#,
    )
    .unwrap();
    let mut parents = owners();
    script
        .inject(&mut parents, &pets(), &Value::Null, &functions, false, "pet")
        .unwrap();
    assert_eq!(
        as_json(&parents),
        json!([
            {"id": 1, "name": "ann", "pet": {"name": "rex"}},
            {"id": 2, "name": "bob", "pet": {"name": "tom"}},
            {"id": 3, "name": "cy", "pet": null}
        ])
    );
}

#[test]
fn test_inject_nested_path_and_projection() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(
        r#"{"filter": {"$and": [
                {"$eq": ["@r.id", "@fr.ownerId"]},
                {"$eq": ["@fr.address.city", "@p.city"]}
            ]},
            "projection": {"address.city": true, "name": true}}"#,
    )
    .unwrap();
    let params = Value::from(json!({"city": "oslo"}));
    let mut parents = rows(json!([{"id": 1}, {"id": 2}]));
    script
        .inject(&mut parents, &pets(), &params, &functions, true, "detail.pets")
        .unwrap();
    assert_eq!(
        as_json(&parents),
        json!([
            {"id": 1, "detail": {"pets": [
                {"name": "rex", "address": {"city": "oslo"}},
                {"name": "kit", "address": {"city": "oslo"}}
            ]}},
            {"id": 2, "detail": {"pets": []}}
        ])
    );
}

#[test]
fn test_projection_keeps_requested_order() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(
        r#"{"projection": {"name": true, "address.zip": true, "address.city": true}}"#,
    )
    .unwrap();
    let mut parents = rows(json!([{"id": 1}]));
    script
        .inject(&mut parents, &pets(), &Value::Null, &functions, false, "pet")
        .unwrap();
    assert_eq!(
        serde_json::to_string(&as_json(&parents)).unwrap(),
        r#"[{"id":1,"pet":{"name":"rex","address":{"zip":"0150","city":"oslo"}}}]"#
    );
}

#[test]
fn test_inject_without_filter() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(r#"{"projection": {"name": true}}"#).unwrap();

    let mut parents = rows(json!([{"id": 1}]));
    script
        .inject(&mut parents, &pets(), &Value::Null, &functions, true, "all")
        .unwrap();
    assert_eq!(
        as_json(&parents),
        json!([{"id": 1, "all": [{"name": "rex"}, {"name": "tom"}, {"name": "kit"}]}])
    );

    let mut parents = rows(json!([{"id": 1}]));
    script
        .inject(&mut parents, &pets(), &Value::Null, &functions, false, "first")
        .unwrap();
    assert_eq!(as_json(&parents), json!([{"id": 1, "first": {"name": "rex"}}]));
}

#[test]
fn test_inject_propagates_evaluation_errors() {
    let functions = FunctionRegistry::new();
    let script = FetchScript::parse(r##"{"#missing": ["@r.id"]}"##).unwrap();
    let mut parents = owners();
    assert!(
        script
            .inject(&mut parents, &pets(), &Value::Null, &functions, true, "x")
            .is_err()
    );
}
