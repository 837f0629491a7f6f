use jpq_bytecode::{BinaryOp, Method, UnaryOp};
use jpq_compiler::builder::*;
use jpq_compiler::{ParseNode, encode};
use jpq_core::Mode;
use serde_json::{Value, json};

use crate::{ErrorKind, EvalError, Evaluator};

fn run(tree: &ParseNode, mode: Mode, doc: &Value) -> Result<Vec<Value>, EvalError> {
    let query = encode(tree, mode).unwrap();
    let items = Evaluator::<Value>::new(&query).query(doc)?;
    Ok(items.iter().map(|item| item.to_json()).collect())
}

fn lax(tree: &ParseNode, doc: &Value) -> Vec<Value> {
    run(tree, Mode::Lax, doc).unwrap()
}

fn at(name: &str) -> ParseNode {
    root().then(key(name))
}

#[test]
fn type_names() {
    let doc = json!({"n": null, "b": false, "i": 1, "s": "x", "a": [], "o": {}});
    let types: Vec<Value> = ["n", "b", "i", "s", "a", "o"]
        .iter()
        .flat_map(|k| lax(&at(k).then(method(Method::Type)), &doc))
        .collect();
    assert_eq!(
        types,
        [
            json!("null"),
            json!("boolean"),
            json!("number"),
            json!("string"),
            json!("array"),
            json!("object")
        ]
    );

    let doc = json!({"d": "2024-01-02"});
    let tree = at("d").then(method(Method::Datetime)).then(method(Method::Type));
    assert_eq!(lax(&tree, &doc), [json!("date")]);
}

#[test]
fn size() {
    let doc = json!({"a": [1, 2, 3], "s": "x"});
    assert_eq!(lax(&at("a").then(method(Method::Size)), &doc), [json!(3)]);
    assert_eq!(lax(&at("s").then(method(Method::Size)), &doc), [json!(1)]);

    let err = run(&at("s").then(method(Method::Size)), Mode::Strict, &doc).unwrap_err();
    assert_eq!(
        err,
        EvalError::TypeMismatch(
            "jsonpath item method .size() can only be applied to an array".to_string()
        )
    );
}

#[test]
fn numeric_methods() {
    let doc = json!({"x": -2.5, "v": [1.2, -1.2]});
    assert_eq!(lax(&at("x").then(method(Method::Abs)), &doc), [json!(2.5)]);
    assert_eq!(lax(&at("x").then(method(Method::Floor)), &doc), [json!(-3)]);
    assert_eq!(lax(&at("x").then(method(Method::Ceiling)), &doc), [json!(-2)]);
    // lax applies item methods to each element
    assert_eq!(
        lax(&at("v").then(method(Method::Ceiling)), &doc),
        [json!(2), json!(-1)]
    );

    let err = run(&at("v").then(method(Method::Abs)), Mode::Strict, &doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "jsonpath item method .abs() can only be applied to a numeric value"
    );
}

#[test]
fn double() {
    let doc = json!({"i": 2, "s": " 1.5 ", "bad": "abc", "inf": "inf", "b": true});
    assert_eq!(lax(&at("i").then(method(Method::Double)), &doc), [json!(2.0)]);
    assert_eq!(lax(&at("s").then(method(Method::Double)), &doc), [json!(1.5)]);

    let err = run(&at("bad").then(method(Method::Double)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arithmetic);
    let err = run(&at("inf").then(method(Method::Double)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "NaN or Infinity is not allowed for jsonpath item method .double()"
    );
    let err = run(&at("b").then(method(Method::Double)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn keyvalue() {
    let doc = json!({"o": {"a": 1, "b": [2]}});
    assert_eq!(
        lax(&at("o").then(method(Method::KeyValue)), &doc),
        [
            json!({"key": "a", "value": 1}),
            json!({"key": "b", "value": [2]})
        ]
    );
    let tree = at("o")
        .then(method(Method::KeyValue))
        .then(key("key"));
    assert_eq!(lax(&tree, &doc), [json!("a"), json!("b")]);

    let err = run(&at("o").then(key("a")).then(method(Method::KeyValue)), Mode::Lax, &doc)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn datetime() {
    let doc = json!({"ts": "2024-05-06T07:08:09+02:00", "bad": "yesterday", "n": 5});
    assert_eq!(
        lax(&at("ts").then(method(Method::Datetime)), &doc),
        [json!("2024-05-06T07:08:09+02:00")]
    );
    let err = run(&at("bad").then(method(Method::Datetime)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err.to_string(), "datetime format is not recognized: \"yesterday\"");
    let err = run(&at("n").then(method(Method::Datetime)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn binary_arithmetic_needs_single_numbers() {
    let doc = json!({"a": [1, 2], "s": "x", "z": 0});
    let err = run(&binary(BinaryOp::Add, at("a"), int(1)), Mode::Lax, &doc).unwrap_err();
    assert_eq!(
        err,
        EvalError::SingletonRequired(
            "left operand of jsonpath operator + is not a single numeric value".to_string()
        )
    );

    let err = run(&binary(BinaryOp::Mul, int(1), at("s")), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(
        err.to_string(),
        "right operand of jsonpath operator * is not a single numeric value"
    );

    let err = run(&binary(BinaryOp::Div, int(1), at("z")), Mode::Lax, &doc).unwrap_err();
    assert_eq!(err, EvalError::Arithmetic("division by zero".to_string()));
}

#[test]
fn unary_arithmetic_maps_over_sequences() {
    let doc = json!({"a": [1, -2], "s": "x"});
    assert_eq!(
        lax(&unary(UnaryOp::Minus, at("a")), &doc),
        [json!(-1), json!(2)]
    );
    assert_eq!(lax(&unary(UnaryOp::Plus, at("a")), &doc), [json!(1), json!(-2)]);

    let err = run(&unary(UnaryOp::Minus, at("s")), Mode::Lax, &doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "operand of unary jsonpath operator - is not a numeric value"
    );
}

#[test]
fn arithmetic_errors_in_filters_are_unknown() {
    let doc = json!([{"a": 1}, {"a": "x"}, {"a": 3}]);
    let tree = root().then(any_array()).then(filter(binary(
        BinaryOp::Greater,
        binary(BinaryOp::Mul, current().then(key("a")), int(2)),
        int(3),
    )));
    assert_eq!(lax(&tree, &doc), [json!({"a": 3})]);
}
