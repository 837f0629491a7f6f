use jpq_core::{Numeric, Scalar, hash_key, hash_scalar};
use serde_json::{Value, json};

use crate::{Entry, Scheme, Text, extract_document};

fn sorted(doc: &Value, scheme: Scheme) -> Vec<Entry> {
    let mut entries = extract_document(doc, scheme);
    entries.sort();
    entries
}

fn chain(keys: &[&str], scalar: Scalar) -> Entry {
    let mut hash = 0;
    for key in keys {
        hash_key(key, &mut hash);
    }
    hash_scalar(&scalar, &mut hash);
    Entry::PathHash(hash)
}

fn number(n: i64) -> Scalar {
    Scalar::Number(Numeric::Int(n))
}

#[test]
fn full_key_entries() {
    let doc = json!({"a": {"b": "x"}, "tags": ["red", 1, null], "n": 1.0});
    let mut expected = vec![
        Entry::key("a"),
        Entry::key("b"),
        Entry::String(Text::Plain("x".to_string())),
        Entry::key("tags"),
        Entry::key("red"),
        Entry::value(&number(1)),
        Entry::Null,
        Entry::key("n"),
    ];
    expected.sort();
    assert_eq!(sorted(&doc, Scheme::FullKey), expected);
}

#[test]
fn full_key_top_level_scalars_are_values() {
    assert_eq!(
        extract_document(&json!("x"), Scheme::FullKey),
        [Entry::String(Text::Plain("x".to_string()))]
    );
    assert_eq!(extract_document(&json!(false), Scheme::FullKey), [Entry::Bool(false)]);
}

#[test]
fn entries_are_deduplicated_in_document_order() {
    let doc = json!([1, "a", 1, "a", true]);
    assert_eq!(
        extract_document(&doc, Scheme::FullKey),
        [Entry::value(&number(1)), Entry::key("a"), Entry::Bool(true)]
    );
}

#[test]
fn hash_chain_entries() {
    let doc = json!({"a": {"b": 1}, "c": [true, [null]], "d": 2});
    let mut expected = vec![
        chain(&["a", "b"], number(1)),
        chain(&["c"], Scalar::Bool(true)),
        chain(&["c"], Scalar::Null),
        chain(&["d"], number(2)),
    ];
    expected.sort();
    assert_eq!(sorted(&doc, Scheme::HashChain), expected);

    assert_eq!(
        extract_document(&json!("top"), Scheme::HashChain),
        [chain(&[], Scalar::String("top".to_string()))]
    );
}

#[test]
fn empty_containers_have_no_entries() {
    assert!(extract_document(&json!({}), Scheme::FullKey).is_empty());
    assert!(extract_document(&json!([[], {}]), Scheme::HashChain).is_empty());
}
