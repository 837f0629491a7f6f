use serde_json::{Value, json};

use super::document::{DocKind, Document, Token, tokens};

fn render(doc: &Value) -> Vec<String> {
    tokens(doc)
        .map(|token| match token {
            Token::BeginArray(_) => "[".to_string(),
            Token::BeginObject(n) => format!("{{{n}"),
            Token::Key(k) => format!("key {k}"),
            Token::Value(v) => format!("value {v}"),
            Token::Elem(v) => format!("elem {v}"),
            Token::EndArray => "]".to_string(),
            Token::EndObject => "}".to_string(),
        })
        .collect()
}

#[test]
fn json_value_kinds() {
    assert_eq!(json!(null).kind(), DocKind::Null);
    assert_eq!(json!(true).kind(), DocKind::Bool);
    assert_eq!(json!(1.5).kind(), DocKind::Number);
    assert_eq!(json!("x").kind(), DocKind::String);
    assert_eq!(json!([]).kind(), DocKind::Array);
    assert_eq!(json!({}).kind(), DocKind::Object);
}

#[test]
fn random_access() {
    let doc = json!({"a": [10, 20]});
    let a = Document::get(&doc, "a").unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a.get_index(1), Some(&json!(20)));
    assert_eq!(a.get_index(2), None);
    assert_eq!(Document::get(&doc, "b"), None);
}

#[test]
fn scalar_root_is_a_single_value() {
    assert_eq!(render(&json!(5)), ["value 5"]);
}

#[test]
fn walk_is_depth_first_in_document_order() {
    let doc = json!({"a": 1, "b": [true, {"c": null}], "d": {}});
    insta::assert_snapshot!(render(&doc).join("\n"), @r#"
    {3
    key a
    value 1
    key b
    [
    elem true
    {1
    key c
    value null
    }
    ]
    key d
    {0
    }
    }
    "#);
}

#[test]
fn walk_handles_deep_nesting() {
    let mut doc = json!(0);
    for _ in 0..10_000 {
        doc = Value::Array(vec![doc]);
    }
    let count = tokens(&doc).count();
    assert_eq!(count, 20_001);
    // Avoid recursive drop of the deep value.
    let mut current = doc;
    while let Value::Array(mut items) = current {
        current = items.pop().unwrap_or(Value::Null);
    }
}

#[test]
fn to_json_round_trips() {
    let doc = json!({"a": [1, "two", null], "b": {"c": false}});
    assert_eq!(Document::to_json(&doc), doc);
}
