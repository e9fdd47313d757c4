//! End-to-end scenarios: JSON text in, value out.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use jse_lang::{
    Ast, Error, Expression, Function, FunctionRegistry, FunctionResolver, NodeKind, Operator,
    RootContext, Syntax, Value, convert::value_to_json, validate,
};
use proptest::prelude::*;
use serde_json::json;

fn run(expression: &str, variables: serde_json::Value) -> Result<Value, Error> {
    let functions = FunctionRegistry::with_builtins();
    run_with(expression, variables, &functions)
}

fn run_with(
    expression: &str,
    variables: serde_json::Value,
    functions: &FunctionRegistry,
) -> Result<Value, Error> {
    let expr = Expression::parse(expression)?;
    let ctx = RootContext::from_json(variables, functions);
    Ok(expr.evaluate(&ctx)?)
}

fn items() -> serde_json::Value {
    json!({"items": [{"score": 1}, {"score": 5}, {"score": 9}]})
}

#[test]
fn test_between_age() {
    let expr = r#"{"$between": ["@age", 1, 10]}"#;
    assert_eq!(run(expr, json!({"age": 5})).unwrap(), Value::Boolean(true));
    assert_eq!(run(expr, json!({"age": 11})).unwrap(), Value::Boolean(false));
}

#[test]
fn test_loose_and_strict_name_match() {
    let vars = json!({"name": "corant"});
    assert_eq!(
        run(r#"{"$eq": ["@name", "corant"]}"#, vars.clone()).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        run(r#"{"$eqs": ["@name", "Corant"]}"#, vars).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_filter_scores() {
    let result = run(
        r#"{"$filter": ["@items", {"$decl": "it"}, {"$gt": ["@it.score", 3]}]}"#,
        items(),
    )
    .unwrap();
    assert_eq!(value_to_json(&result), json!([{"score": 5}, {"score": 9}]));
}

#[test]
fn test_map_scores() {
    let result = run(r#"{"$map": ["@items", {"$decl": "it"}, "@it.score"]}"#, items()).unwrap();
    assert_eq!(value_to_json(&result), json!([1, 5, 9]));
}

/// A registered `add` that only knows about numbers.
struct NumericAdd;

impl FunctionResolver for NumericAdd {
    fn supports(&self, name: &str) -> bool {
        name == "add"
    }

    fn resolve(&self, _name: &str) -> Function {
        Arc::new(|args: &[Value]| {
            let sum: i64 = args.iter().filter_map(Value::as_int).sum();
            Ok(Value::Integer(sum))
        })
    }
}

#[test]
fn test_reduce_scores() {
    let expr = r##"{"$reduce": ["@items", {"$decl": "acc,it"}, {"#add": ["@acc", "@it.score"]}]}"##;

    let mut functions = FunctionRegistry::new();
    functions.register(NumericAdd);
    assert_eq!(run_with(expr, items(), &functions).unwrap(), Value::Integer(15));

    // the builtin add agrees
    assert_eq!(run(expr, items()).unwrap(), Value::Integer(15));
}

#[test]
fn test_malformed_between() {
    match run(r#"{"$between": ["@age", 1]}"#, json!({"age": 5})) {
        Err(Error::Structural(e)) => {
            assert_eq!(e.token, "$between");
            assert!(e.to_string().contains("between"));
        }
        other => panic!("expected a structural error, got {:?}", other),
    }
}

/// Resolver counting how often `tick` gets called.
struct Tick(Arc<AtomicUsize>);

impl FunctionResolver for Tick {
    fn supports(&self, name: &str) -> bool {
        name == "tick"
    }

    fn resolve(&self, _name: &str) -> Function {
        let calls = Arc::clone(&self.0);
        Arc::new(move |_: &[Value]| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Boolean(true))
        })
    }
}

#[test]
fn test_short_circuit_evaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut functions = FunctionRegistry::new();
    functions.register(Tick(Arc::clone(&calls)));

    let cases = [
        (r##"{"$and": [false, {"#tick": []}]}"##, 0),
        (r##"{"$or": [true, {"#tick": []}]}"##, 0),
        (r##"{"$not": [0, {"#tick": []}]}"##, 0),
        (r##"{"$nor": [1, {"#tick": []}]}"##, 0),
        (r##"{"$cond": [true, 1, {"#tick": []}]}"##, 0),
        (r##"{"$nvl": [1, {"#tick": []}]}"##, 0),
        (r##"{"$and": [true, {"#tick": []}]}"##, 1),
        (r##"{"$cond": [false, 1, {"#tick": []}]}"##, 1),
    ];
    for (expr, expected) in cases {
        calls.store(0, Ordering::SeqCst);
        run_with(expr, json!({}), &functions).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), expected, "{}", expr);
    }
}

#[test]
fn test_expression_is_reusable() {
    let expr = Expression::parse(r#"{"$gt": ["@age", 18]}"#).unwrap();
    let functions = FunctionRegistry::new();
    for (age, adult) in [(30, true), (12, false), (18, false)] {
        let ctx = RootContext::from_json(json!({"age": age}), &functions);
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Boolean(adult));
    }
}

fn spread(op: Operator, operands: &[i64]) -> Ast {
    let mut ast = Ast::new();
    let root = ast.push(NodeKind::Operator(op));
    for &n in operands {
        let child = ast.push(NodeKind::Value(Value::Integer(n)));
        ast.add_child(root, child).unwrap();
    }
    ast.post_construct(root);
    ast.set_root(root).unwrap();
    ast
}

fn wrapped(op: Operator, operands: &[i64]) -> Ast {
    let mut ast = Ast::new();
    let root = ast.push(NodeKind::Operator(op));
    let array = ast.push(NodeKind::Array);
    for &n in operands {
        let child = ast.push(NodeKind::Value(Value::Integer(n)));
        ast.add_child(array, child).unwrap();
    }
    ast.add_child(root, array).unwrap();
    ast.post_construct(root);
    ast.set_root(root).unwrap();
    ast
}

proptest! {
    #[test]
    fn spread_and_wrapped_operands_are_equivalent(
        operands in prop::collection::vec(-20i64..20, 1..6),
        index in 0usize..6,
    ) {
        let op = [
            Operator::And,
            Operator::Or,
            Operator::Distinct,
            Operator::Return,
            Operator::In,
            Operator::Nor,
        ][index];
        let syntax = Syntax::default();
        let functions = FunctionRegistry::new();
        let ctx = RootContext::new(Value::Null, &functions);

        let a = spread(op, &operands);
        let b = wrapped(op, &operands);
        prop_assert_eq!(
            a.to_token(a.root().unwrap(), &syntax),
            b.to_token(b.root().unwrap(), &syntax)
        );

        let a = validate(a).unwrap().evaluate(&ctx).unwrap();
        let b = validate(b).unwrap().evaluate(&ctx).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn canonical_form_is_stable(operands in prop::collection::vec(-20i64..20, 1..6)) {
        let source = json!({"$distinct": operands});
        let once = Expression::from_token(&source).unwrap().to_token();
        let twice = Expression::from_token(&once).unwrap().to_token();
        prop_assert_eq!(&once, &source);
        prop_assert_eq!(once, twice);
    }
}
