use indoc::indoc;
use jpq_bytecode::{ANY_LAST, BinaryOp, HigherOrderKind, RegexFlags};
use serde_json::json;

use crate::builder::*;
use crate::parse_tree::{ParseNode, PathItem};

#[test]
fn deserializes_nested_chains() {
    let tree: ParseNode = serde_json::from_str(indoc! {r#"
        {
          "type": "root",
          "next": {
            "type": "key",
            "name": "items",
            "next": {
              "type": "filter",
              "arg": {
                "type": "binary",
                "op": "greater",
                "left": {"type": "current", "next": {"type": "key", "name": "price"}},
                "right": {"type": "numeric", "value": 10}
              }
            }
          }
        }
    "#})
    .unwrap();

    let expected = root().then(key("items")).then(filter(binary(
        BinaryOp::Greater,
        current().then(key("price")),
        int(10),
    )));
    assert_eq!(tree, expected);
}

#[test]
fn optional_fields_have_defaults() {
    let tree: ParseNode = serde_json::from_str(r#"{"type": "any"}"#).unwrap();
    assert_eq!(
        tree.item,
        PathItem::Any {
            first: 0,
            last: ANY_LAST
        }
    );

    let tree: ParseNode =
        serde_json::from_str(r#"{"type": "like_regex", "expr": {"type": "root"}, "pattern": "^a"}"#)
            .unwrap();
    let PathItem::LikeRegex { flags, .. } = tree.item else {
        panic!("expected like_regex");
    };
    assert!(flags.is_empty());
}

#[test]
fn serializes_without_empty_fields() {
    let tree = root().then(key("a")).then(method_call(
        HigherOrderKind::Map,
        None,
        Some(lambda(&["x"], var("x"))),
    ));
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "type": "root",
            "next": {
                "type": "key",
                "name": "a",
                "next": {
                    "type": "higher_order",
                    "kind": "map",
                    "lambda": {"type": "lambda", "params": ["x"], "body": {"type": "variable", "name": "x"}}
                }
            }
        })
    );
}

#[test]
fn regex_flags_use_letters() {
    let tree = like_regex(current(), "a+", RegexFlags::parse("qi").unwrap());
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(value["flags"], "iq");

    let back: ParseNode = serde_json::from_value(value).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn rejects_unknown_node_types() {
    let err = serde_json::from_str::<ParseNode>(r#"{"type": "wildcard"}"#).unwrap_err();
    assert!(err.to_string().contains("unknown variant `wildcard`"));
}

#[test]
fn then_appends_at_the_tail() {
    let tree = root().then(key("a").then(key("b"))).then(key("c"));
    let names: Vec<_> = tree
        .steps()
        .filter_map(|step| match &step.item {
            PathItem::Key { name } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(tree.steps().count(), 4);
}

#[test]
fn predicate_heads() {
    assert!(eq(root(), int(1)).is_predicate());
    assert!(exists(root()).is_predicate());
    assert!(like_regex(root(), "x", RegexFlags::default()).is_predicate());
    assert!(!binary(BinaryOp::Add, int(1), int(2)).is_predicate());
    assert!(!root().then(filter(eq(current(), int(1)))).is_predicate());
}
