use jpq_core::{Colors, Mode, Numeric};

use crate::codec::ByteBuf;
use crate::header::Header;
use crate::query::{CompiledQuery, DecodeError, Node, NodeRef};
use crate::tag::{BinaryOp, HigherOrderKind, Tag};
use crate::{dump, render};

fn rel(from: usize, to: usize) -> i32 {
    (to - from) as i32
}

/// `$."a"`
fn root_key(mode: Mode, key: &str) -> Vec<u8> {
    let mut buf = ByteBuf::with_header(&Header::new(mode));
    let root = buf.begin_node(Tag::Root);
    let key_at = buf.begin_node(Tag::Key);
    buf.push_str(key);
    buf.set_next(root, rel(root, key_at));
    buf.finish()
}

/// `$ == 1`
fn root_equals_one() -> Vec<u8> {
    let mut buf = ByteBuf::with_header(&Header::default());
    let eq = buf.begin_node(Tag::Binary(BinaryOp::Equal));
    let left = buf.reserve();
    let right = buf.reserve();
    let root = buf.begin_node(Tag::Root);
    buf.patch_i32(left, rel(eq, root));
    let one = buf.begin_node(Tag::Numeric);
    buf.push_str(&Numeric::Int(1).to_blob());
    buf.patch_i32(right, rel(eq, one));
    buf.finish()
}

#[test]
fn rejects_short_buffers() {
    let err = CompiledQuery::from_bytes(vec![0; 8]).unwrap_err();
    assert_eq!(err, DecodeError::BufferTooSmall(8));
    assert!(err.to_string().contains("minimum 20"));
}

#[test]
fn rejects_foreign_header() {
    let mut bytes = root_key(Mode::Lax, "a");
    bytes[0] = b'Q';
    assert_eq!(
        CompiledQuery::from_bytes(bytes).unwrap_err(),
        DecodeError::InvalidMagic
    );

    let mut bytes = root_key(Mode::Lax, "a");
    bytes[4] = 2;
    let err = CompiledQuery::from_bytes(bytes).unwrap_err();
    assert_eq!(err, DecodeError::UnsupportedVersion(2));
    assert_eq!(err.to_string(), "unsupported version: 2 (expected 1)");
}

#[test]
fn views_follow_next_chain() {
    let query = CompiledQuery::from_bytes(root_key(Mode::Strict, "name")).unwrap();
    assert_eq!(query.mode(), Mode::Strict);
    assert_eq!(query.root(), NodeRef::new(12));

    let root = query.root_view().unwrap();
    assert_eq!(root.tag, Tag::Root);
    assert!(matches!(root.node, Node::Root));
    assert!(!root.is_external());

    let key = query.view(root.next.unwrap()).unwrap();
    assert!(matches!(key.node, Node::Key("name")));
    assert_eq!(key.next, None);
}

#[test]
fn binary_operands() {
    let query = CompiledQuery::from_bytes(root_equals_one()).unwrap();
    let Node::Binary { op, left, right } = query.root_view().unwrap().node else {
        panic!("expected binary node");
    };
    assert_eq!(op, BinaryOp::Equal);
    assert_eq!(query.view(left).unwrap().tag, Tag::Root);
    assert!(matches!(
        query.view(right).unwrap().node,
        Node::Numeric(Numeric::Int(1))
    ));
}

#[test]
fn rejects_backward_offsets() {
    let mut bytes = root_equals_one();
    bytes[20..24].copy_from_slice(&(-4i32).to_le_bytes());
    let query = CompiledQuery::from_bytes(bytes).unwrap();

    let err = query.root_view().unwrap_err();
    assert_eq!(
        err,
        DecodeError::Malformed {
            offset: 20,
            reason: "offset points backwards"
        }
    );
}

#[test]
fn rejects_offsets_past_end() {
    let mut bytes = root_key(Mode::Lax, "a");
    bytes[16..20].copy_from_slice(&400i32.to_le_bytes());
    let query = CompiledQuery::from_bytes(bytes).unwrap();

    let err = query.root_view().unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Malformed {
            reason: "offset out of bounds",
            ..
        }
    ));
}

#[test]
fn rejects_unknown_tags() {
    let mut bytes = root_key(Mode::Lax, "a");
    bytes[12] = 0xEE;
    let query = CompiledQuery::from_bytes(bytes).unwrap();
    assert_eq!(
        query.root_view().unwrap_err(),
        DecodeError::Malformed {
            offset: 12,
            reason: "unknown node tag"
        }
    );
}

#[test]
fn rejects_invalid_utf8_keys() {
    let mut bytes = root_key(Mode::Lax, "ab");
    // key payload starts after the key node header at 20
    bytes[32] = 0xFF;
    let query = CompiledQuery::from_bytes(bytes).unwrap();
    let next = query.root_view().unwrap().next.unwrap();
    assert!(matches!(
        query.view(next).unwrap_err(),
        DecodeError::Malformed {
            reason: "string is not UTF-8",
            ..
        }
    ));
}

#[test]
fn rejects_oversized_operand_lists() {
    let mut buf = ByteBuf::with_header(&Header::default());
    buf.begin_node(Tag::Sequence);
    buf.push_u32(u32::MAX);
    let query = CompiledQuery::from_bytes(buf.finish()).unwrap();

    assert!(matches!(
        query.root_view().unwrap_err(),
        DecodeError::Malformed {
            reason: "operand list past end of buffer",
            ..
        }
    ));
}

#[test]
fn lambda_params_and_method_form() {
    // `$.map((x, i) => $x)`
    let mut buf = ByteBuf::with_header(&Header::default());
    let root = buf.begin_node(Tag::Root);
    let call = buf.begin_node(Tag::HigherOrder(HigherOrderKind::Map));
    buf.set_next(root, rel(root, call));
    buf.push_i32(0);
    let lambda_slot = buf.reserve();
    buf.push_i32(0);
    let lambda = buf.begin_node(Tag::Lambda);
    buf.patch_i32(lambda_slot, rel(call, lambda));
    buf.push_u32(2);
    let body_slot = buf.reserve();
    buf.push_str("x");
    buf.push_str("i");
    let body = buf.begin_node(Tag::Variable);
    buf.push_str("x");
    buf.patch_i32(body_slot, rel(lambda, body));
    let query = CompiledQuery::from_bytes(buf.finish()).unwrap();

    let call = query.view(query.root_view().unwrap().next.unwrap()).unwrap();
    let Node::HigherOrder {
        kind,
        array,
        lambda,
        seed,
    } = call.node
    else {
        panic!("expected higher-order node");
    };
    assert_eq!(kind, HigherOrderKind::Map);
    assert_eq!(array, None);
    assert_eq!(seed, None);

    let Node::Lambda { params, body } = query.view(lambda.unwrap()).unwrap().node else {
        panic!("expected lambda");
    };
    assert_eq!(params.len(), 2);
    assert_eq!(params.collect::<Vec<_>>(), ["x", "i"]);
    assert!(matches!(query.view(body).unwrap().node, Node::Variable("x")));

    assert_eq!(render(&query).unwrap(), "$.map((x, i) => $x)");
}

#[test]
fn renders_strict_prefix_and_quoted_keys() {
    let query = CompiledQuery::from_bytes(root_key(Mode::Strict, "a\"b")).unwrap();
    assert_eq!(render(&query).unwrap(), r#"strict $."a\"b""#);

    let query = CompiledQuery::from_bytes(root_equals_one()).unwrap();
    assert_eq!(render(&query).unwrap(), "$ == 1");
}

#[test]
fn dump_lists_nodes() {
    let query = CompiledQuery::from_bytes(root_equals_one()).unwrap();
    insta::assert_snapshot!(dump(&query, Colors::OFF).unwrap(), @r"
    [header] lax v1 externals=0
    0012 Equal
    0028   Root
    0036   Numeric 1
    ");

    let query = CompiledQuery::from_bytes(root_key(Mode::Strict, "a")).unwrap();
    insta::assert_snapshot!(dump(&query, Colors::OFF).unwrap(), @r#"
    [header] strict v1 externals=0
    0012 Root
    0020 Key "a"
    "#);
}
