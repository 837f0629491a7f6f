use jpq_core::{Datetime, Numeric, Scalar};
use serde_json::{Value, json};

use crate::item::{Item, Shape};

type V<'a> = Item<'a, Value>;

#[test]
fn document_and_computed_items_agree() {
    let doc = json!({"a": [1, "x"]});
    let node = V::Node(&doc);
    let computed = V::Object(vec![(
        "a".to_string(),
        V::Array(vec![V::Number(Numeric::Int(1)), V::String("x".to_string())]),
    )]);
    for item in [&node, &computed] {
        assert!(item.is_object());
        let a = item.member("a").unwrap();
        assert_eq!(a.array_len(), Some(2));
        assert_eq!(a.element(1).unwrap().as_str(), Some("x"));
        assert!(a.element(2).is_none());
        assert_eq!(item.entries().len(), 1);
        assert_eq!(item.to_json(), doc);
    }
}

#[test]
fn shapes() {
    let doc = json!([null, true, 2.5, "s"]);
    let elements = V::Node(&doc).elements();
    assert_eq!(elements[0].shape(), Shape::Null);
    assert_eq!(elements[1].as_bool(), Some(true));
    assert!(matches!(elements[2].as_number(), Some(Numeric::Float(f)) if f == 2.5));
    assert_eq!(elements[3].as_str(), Some("s"));
    assert!(V::Null.elements().is_empty());
    assert!(V::Bool(true).entries().is_empty());
}

#[test]
fn type_names() {
    let date = Datetime::parse("2024-01-02").unwrap();
    assert_eq!(V::DateTime(date).type_name(), "date");
    assert_eq!(V::Array(vec![]).type_name(), "array");
    assert_eq!(V::Node(&json!(1)).type_name(), "number");
}

#[test]
fn scalar_conversion() {
    assert_eq!(V::Node(&json!("s")).to_scalar(), Some(Scalar::String("s".to_string())));
    assert_eq!(V::Node(&json!([1])).to_scalar(), None);
    let date = Datetime::parse("2024-01-02").unwrap();
    assert_eq!(
        V::DateTime(date).to_scalar(),
        Some(Scalar::String("2024-01-02".to_string()))
    );
    assert!(matches!(V::from_scalar(Scalar::Bool(false)), Item::Bool(false)));
}

#[test]
fn serializes_as_json() {
    let item = V::Array(vec![V::Null, V::DateTime(Datetime::parse("10:30:00").unwrap())]);
    assert_eq!(serde_json::to_string(&item).unwrap(), r#"[null,"10:30:00"]"#);
    assert_eq!(format!("{item:?}"), r#"[null,"10:30:00"]"#);
}
