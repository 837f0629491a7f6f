use indoc::indoc;
use jpq_bytecode::{BinaryOp, HigherOrderKind};
use jpq_compiler::builder::*;
use jpq_compiler::encode;
use jpq_core::{Colors, Mode};
use serde_json::{Value, json};

use crate::{Evaluator, PrintTracer};

/// Trace lines without the offset column.
fn body(tracer: &PrintTracer) -> String {
    let mut out = String::new();
    for line in tracer.lines() {
        out.push_str(line.get(5..).unwrap_or_default());
        out.push('\n');
    }
    out
}

#[test]
fn traces_path_steps() {
    let query = encode(&root().then(key("a")), Mode::Lax).unwrap();
    let mut tracer = PrintTracer::new(Colors::OFF);
    let doc = json!({"a": 1});
    Evaluator::<Value>::new(&query)
        .query_with(&doc, &mut tracer)
        .unwrap();

    assert!(tracer.lines()[0].starts_with("0012 Root"));
    assert_eq!(
        body(&tracer),
        indoc! {r#"
            Root
              Key "a"
                => 1
        "#}
    );
}

#[test]
fn traces_predicates_and_lambdas() {
    let tree = root().then(key("a")).then(method_call(
        HigherOrderKind::Map,
        None,
        Some(lambda(&["x"], binary(BinaryOp::Greater, var("x"), int(1)))),
    ));
    let query = encode(&tree, Mode::Lax).unwrap();
    let mut tracer = PrintTracer::new(Colors::OFF);
    let doc = json!({"a": [1, 2]});
    let items = Evaluator::<Value>::new(&query)
        .query_with(&doc, &mut tracer)
        .unwrap();
    assert_eq!(items[0].to_json(), json!([false, true]));

    let text = body(&tracer);
    assert!(text.contains("Map"));
    assert!(text.contains("call #0"));
    assert!(text.contains("call #1"));
    assert!(text.contains("is false"));
    assert!(text.contains("is true"));
    assert!(text.contains("Variable $x"));
    assert!(text.trim_end().ends_with("=> [false,true]"));
}

#[test]
fn traces_absorbed_errors() {
    let tree = binary(BinaryOp::Equal, root().then(key("missing")), int(1));
    let query = encode(&tree, Mode::Strict).unwrap();
    let mut tracer = PrintTracer::new(Colors::OFF);
    let doc = json!({});
    Evaluator::<Value>::new(&query)
        .query_with(&doc, &mut tracer)
        .unwrap();
    let text = body(&tracer);
    assert!(text.contains(
        "error (structural error): JSON object does not contain key \"missing\""
    ));
    assert!(text.contains("=> null"));
}

#[test]
fn colors_wrap_tags() {
    let query = encode(&root(), Mode::Lax).unwrap();
    let mut tracer = PrintTracer::new(Colors::ON);
    Evaluator::<Value>::new(&query)
        .query_with(&json!(null), &mut tracer)
        .unwrap();
    assert!(tracer.lines()[0].contains("\x1b[34mRoot\x1b[0m"));
    assert_eq!(tracer.into_lines().len(), 2);
}
