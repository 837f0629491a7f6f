use jpq_bytecode::{BinaryOp, CompiledQuery, HigherOrderKind, Node, NodeRef, RegexFlags, Tag};
use jpq_core::{Colors, Mode};
use serde_json::{Value, json};

use crate::builder::*;
use crate::{EncodeError, Encoder, encode};

fn lax(tree: &crate::ParseNode) -> CompiledQuery {
    encode(tree, Mode::Lax).unwrap()
}

fn next(query: &CompiledQuery, at: NodeRef) -> NodeRef {
    query.view(at).unwrap().next.unwrap()
}

#[test]
fn header_records_mode() {
    assert!(lax(&root()).is_lax());
    let strict = encode(&root(), Mode::Strict).unwrap();
    assert_eq!(strict.mode(), Mode::Strict);
    assert_eq!(strict.external_count(), 0);
}

#[test]
fn current_needs_an_enclosing_filter() {
    assert_eq!(
        encode(&current(), Mode::Lax).unwrap_err(),
        EncodeError::CurrentOutsideFilter
    );

    let tree = root().then(filter(eq(current_at(2), int(1))));
    assert_eq!(
        encode(&tree, Mode::Lax).unwrap_err(),
        EncodeError::InvalidLevel {
            level: 2,
            innermost: 1
        }
    );
}

#[test]
fn current_resolves_to_innermost_level() {
    let tree = root().then(filter(exists(
        current().then(filter(eq(current_at(1), current()))),
    )));
    let query = lax(&tree);

    let filter_at = next(&query, query.root());
    let Node::Filter(exists_at) = query.view(filter_at).unwrap().node else {
        panic!("expected filter");
    };
    let Node::Unary { arg, .. } = query.view(exists_at).unwrap().node else {
        panic!("expected exists");
    };
    assert!(matches!(
        query.view(arg).unwrap().node,
        Node::Current { level: 1 }
    ));

    let Node::Filter(eq_at) = query.view(next(&query, arg)).unwrap().node else {
        panic!("expected inner filter");
    };
    let Node::Binary { left, right, .. } = query.view(eq_at).unwrap().node else {
        panic!("expected comparison");
    };
    assert!(matches!(query.view(left).unwrap().node, Node::Current { level: 1 }));
    assert!(matches!(query.view(right).unwrap().node, Node::Current { level: 2 }));
}

#[test]
fn last_only_inside_subscripts() {
    assert_eq!(
        encode(&last(), Mode::Lax).unwrap_err(),
        EncodeError::LastOutsideSubscript
    );
    let tree = root().then(index(vec![(
        binary(BinaryOp::Sub, last(), int(1)),
        Some(last()),
    )]));
    assert!(encode(&tree, Mode::Lax).is_ok());
}

#[test]
fn lambdas_only_as_higher_order_arguments() {
    assert_eq!(
        encode(&lambda(&["x"], var("x")), Mode::Lax).unwrap_err(),
        EncodeError::LambdaOutsideCall
    );

    let tree = call(HigherOrderKind::Map, root(), None, Some(int(1)));
    assert_eq!(
        encode(&tree, Mode::Lax).unwrap_err(),
        EncodeError::LambdaExpected { function: "map" }
    );

    let tree = call(
        HigherOrderKind::Map,
        root(),
        None,
        Some(lambda(&["a", "b", "c", "d"], var("a"))),
    );
    assert_eq!(
        encode(&tree, Mode::Lax).unwrap_err(),
        EncodeError::TooManyParams(4)
    );

    // a lambda nested in the lambda's body is not in argument position
    let tree = call(
        HigherOrderKind::Map,
        root(),
        None,
        Some(lambda(&["x"], lambda(&["y"], var("y")))),
    );
    assert_eq!(
        encode(&tree, Mode::Lax).unwrap_err(),
        EncodeError::LambdaOutsideCall
    );
}

#[test]
fn root_inside_lambda_is_the_lambda_input() {
    let tree = call(
        HigherOrderKind::Map,
        root().then(key("xs")),
        None,
        Some(lambda(&["x"], root().then(key("a")))),
    );
    let query = lax(&tree);

    let Node::HigherOrder { array, lambda, .. } = query.root_view().unwrap().node else {
        panic!("expected map");
    };
    assert_eq!(query.view(array.unwrap()).unwrap().tag, Tag::Root);

    let Node::Lambda { body, .. } = query.view(lambda.unwrap()).unwrap().node else {
        panic!("expected lambda");
    };
    let body = query.view(body).unwrap();
    assert!(matches!(body.node, Node::Current { level: 1 }));
    assert!(matches!(
        query.view(body.next.unwrap()).unwrap().node,
        Node::Key("a")
    ));
}

#[test]
fn regex_patterns_are_checked() {
    let err = encode(
        &like_regex(root(), "(", RegexFlags::default()),
        Mode::Lax,
    )
    .unwrap_err();
    let EncodeError::InvalidRegex { pattern, .. } = err else {
        panic!("expected regex error");
    };
    assert_eq!(pattern, "(");

    let quoted = like_regex(root(), "(", RegexFlags::parse("q").unwrap());
    assert!(encode(&quoted, Mode::Lax).is_ok());
}

#[test]
fn depth_limit() {
    let tree = root().then(key("a")).then(key("b")).then(key("c"));
    let err = Encoder::new().recursion_limit(3).encode(&tree).unwrap_err();
    assert_eq!(err, EncodeError::DepthLimitExceeded(3));
    assert!(Encoder::new().recursion_limit(4).encode(&tree).is_ok());
}

#[test]
fn deep_tree_fails_cleanly_with_default_limits() {
    let mut tree = eq(root().then(key("a")), int(1));
    for _ in 0..50 {
        tree = and(tree, boolean(true));
    }
    assert!(Encoder::new().encode(&tree).is_ok());

    for _ in 50..1_500 {
        tree = and(tree, boolean(true));
    }
    let err = Encoder::new().encode(&tree).unwrap_err();
    assert!(matches!(err, EncodeError::DepthLimitExceeded(n) if n <= 1024));
}

#[test]
fn cache_ids_are_post_order() {
    let tree = operator("f", vec![operator("g", vec![]), cast(root(), "date")]);
    let query = lax(&tree);
    assert_eq!(query.external_count(), 3);

    let root_view = query.root_view().unwrap();
    assert!(root_view.is_external());
    let Node::Operator { name, cache_id, args } = root_view.node else {
        panic!("expected operator");
    };
    assert_eq!((name, cache_id), ("f", 2));

    let args: Vec<_> = args.collect();
    assert!(matches!(
        query.view(args[0]).unwrap().node,
        Node::Operator { name: "g", cache_id: 0, .. }
    ));
    assert!(matches!(
        query.view(args[1]).unwrap().node,
        Node::Cast { type_name: "date", cache_id: 1, .. }
    ));
}

#[test]
fn external_flag_marks_enclosing_nodes() {
    let tree = root()
        .then(key("a"))
        .then(filter(eq(cast(current(), "int"), int(1))));
    let query = lax(&tree);

    insta::assert_snapshot!(jpq_bytecode::dump(&query, Colors::OFF).unwrap(), @r#"
    [header] lax v1 externals=1
    0012 Root [ext]
    0020 Key [ext] "a"
    0036 Filter [ext]
    0048   Equal [ext]
    0064     Cast [ext] ::int #0
    0088       Current level=1
    0100     Numeric 1
    "#);
}

#[test]
fn bound_variables_are_spliced() {
    let vars = json!({"x": [1, {"k": "v"}], "unused": true});
    let vars = vars.as_object().unwrap();
    let tree = root().then(key("a")).then(filter(eq(current(), var("x"))));
    let query = Encoder::new().vars::<Value>(vars).encode(&tree).unwrap();

    assert_eq!(
        query.to_string(),
        r#"$."a"?(@ == [1, {"k": "v"}])"#
    );
}

#[test]
fn lambda_parameters_shadow_bindings() {
    let vars = json!({"x": 100, "k": 10, "xs": [1, 2]});
    let vars = vars.as_object().unwrap();
    let tree = call(
        HigherOrderKind::Map,
        var("xs"),
        None,
        Some(lambda(&["x"], binary(BinaryOp::Add, var("x"), var("k")))),
    );
    let query = Encoder::new().vars::<Value>(vars).encode(&tree).unwrap();
    assert_eq!(query.to_string(), "map([1, 2], (x) => $x + 10)");
}

#[test]
fn unbound_variables_stay() {
    let vars = json!({});
    let tree = var("missing").then(key("a"));
    let query = Encoder::new()
        .vars::<Value>(vars.as_object().unwrap())
        .encode(&tree)
        .unwrap();
    assert_eq!(query.to_string(), r#"$missing."a""#);
}
