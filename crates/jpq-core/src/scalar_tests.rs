use serde_json::json;

use super::{Numeric, Scalar, hash_key, hash_scalar, hash_text};

#[test]
fn from_document() {
    assert_eq!(Scalar::from_document(&json!(null)), Some(Scalar::Null));
    assert_eq!(Scalar::from_document(&json!(3)), Some(Scalar::Number(Numeric::Int(3))));
    assert_eq!(Scalar::from_document(&json!("a")), Some(Scalar::String("a".into())));
    assert_eq!(Scalar::from_document(&json!([1])), None);
}

#[test]
fn hash_is_stable() {
    assert_eq!(hash_text(b's', "a"), hash_text(b's', "a"));
    assert_ne!(hash_text(b's', "1"), hash_text(b'n', "1"));
}

#[test]
fn hash_chain_rotates_before_mixing() {
    let mut hash = 0;
    hash_scalar(&Scalar::Null, &mut hash);
    assert_eq!(hash, 0x01);
    hash_scalar(&Scalar::Bool(true), &mut hash);
    assert_eq!(hash, 0x02 ^ 0x02);
}

#[test]
fn numbers_hash_by_value() {
    let (mut a, mut b) = (0, 0);
    hash_scalar(&Scalar::Number(Numeric::Int(1)), &mut a);
    hash_scalar(&Scalar::Number(Numeric::Float(1.0)), &mut b);
    assert_eq!(a, b);
}

#[test]
fn keys_hash_like_strings() {
    let (mut a, mut b) = (7, 7);
    hash_key("name", &mut a);
    hash_scalar(&Scalar::String("name".into()), &mut b);
    assert_eq!(a, b);
}
