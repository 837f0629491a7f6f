use crate::tag::{BinaryOp, HigherOrderKind, Method, RegexFlags, Tag, UnaryOp};

#[test]
fn tag_bytes_round_trip() {
    let mut known = 0;
    for b in 0..=u8::MAX {
        if let Some(tag) = Tag::from_byte(b) {
            assert_eq!(tag.to_byte(), b, "{tag}");
            known += 1;
        }
    }
    assert_eq!(known, 13 + 14 + 1 + 5 + 1 + 8 + 6 + 8);
}

#[test]
fn unassigned_bytes_are_rejected() {
    assert_eq!(Tag::from_byte(13), None);
    assert_eq!(Tag::from_byte(35), None);
    assert_eq!(Tag::from_byte(78), None);
    assert_eq!(Tag::from_byte(0xFF), None);
}

#[test]
fn operator_families() {
    assert_eq!(Tag::from_byte(20), Some(Tag::Binary(BinaryOp::And)));
    assert_eq!(Tag::from_byte(33), Some(Tag::Binary(BinaryOp::StartsWith)));
    assert_eq!(Tag::from_byte(42), Some(Tag::Unary(UnaryOp::IsUnknown)));
    assert_eq!(Tag::from_byte(56), Some(Tag::Method(Method::KeyValue)));
    assert_eq!(
        Tag::from_byte(75),
        Some(Tag::HigherOrder(HigherOrderKind::FoldRight))
    );
    assert_eq!(Tag::Binary(BinaryOp::LessOrEqual).name(), "LessOrEqual");
}

#[test]
fn predicates() {
    assert!(Tag::Binary(BinaryOp::Equal).is_predicate());
    assert!(Tag::Binary(BinaryOp::StartsWith).is_predicate());
    assert!(Tag::Unary(UnaryOp::Exists).is_predicate());
    assert!(Tag::LikeRegex.is_predicate());
    assert!(!Tag::Binary(BinaryOp::Add).is_predicate());
    assert!(!Tag::Unary(UnaryOp::Minus).is_predicate());
    assert!(!Tag::Key.is_predicate());
}

#[test]
fn precedence_orders_operators() {
    assert!(BinaryOp::Or.precedence() < BinaryOp::And.precedence());
    assert!(BinaryOp::And.precedence() < BinaryOp::Equal.precedence());
    assert!(BinaryOp::Equal.precedence() < BinaryOp::Add.precedence());
    assert!(BinaryOp::Add.precedence() < BinaryOp::Mul.precedence());
}

#[test]
fn regex_flags_text() {
    let flags = RegexFlags::parse("qsi").unwrap();
    assert!(flags.contains(RegexFlags::CASE_INSENSITIVE));
    assert!(flags.contains(RegexFlags::DOT_ALL));
    assert!(!flags.contains(RegexFlags::MULTI_LINE));
    assert_eq!(flags.to_string(), "isq");

    assert_eq!(RegexFlags::parse("iz"), Err('z'));
    assert!(RegexFlags::parse("").unwrap().is_empty());
    assert_eq!(RegexFlags::from_bits(0x20), None);
}

#[test]
fn regex_flags_serde() {
    let flags: RegexFlags = serde_json::from_str(r#""mx""#).unwrap();
    assert_eq!(flags.bits(), RegexFlags::MULTI_LINE | RegexFlags::EXTENDED);
    assert_eq!(serde_json::to_string(&flags).unwrap(), r#""mx""#);

    let err = serde_json::from_str::<RegexFlags>(r#""k""#).unwrap_err();
    assert!(err.to_string().contains("unrecognized like_regex flag 'k'"));
}

#[test]
fn names_in_query_text() {
    assert_eq!(BinaryOp::StartsWith.as_str(), "starts with");
    assert_eq!(Method::Ceiling.as_str(), "ceiling");
    assert_eq!(HigherOrderKind::FoldLeft.as_str(), "foldl");
    assert!(HigherOrderKind::Reduce.is_fold());
    assert!(!HigherOrderKind::Max.is_fold());
}
