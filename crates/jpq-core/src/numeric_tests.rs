use std::cmp::Ordering;

use super::numeric::{Numeric, NumericError};

#[test]
fn int_arithmetic_stays_exact() {
    assert_eq!(Numeric::Int(2).add(Numeric::Int(3)), Ok(Numeric::Int(5)));
    assert_eq!(Numeric::Int(2).sub(Numeric::Int(3)), Ok(Numeric::Int(-1)));
    assert_eq!(Numeric::Int(4).mul(Numeric::Int(3)), Ok(Numeric::Int(12)));
    assert!(matches!(Numeric::Int(6).div(Numeric::Int(3)), Ok(Numeric::Int(2))));
    assert!(matches!(Numeric::Int(7).rem(Numeric::Int(4)), Ok(Numeric::Int(3))));
}

#[test]
fn inexact_division_falls_back_to_float() {
    assert!(matches!(Numeric::Int(7).div(Numeric::Int(2)), Ok(Numeric::Float(f)) if f == 3.5));
}

#[test]
fn overflow_falls_back_to_float() {
    let sum = Numeric::Int(i64::MAX).add(Numeric::Int(1)).unwrap();
    assert!(matches!(sum, Numeric::Float(_)));
    assert_eq!(Numeric::Int(i64::MIN).neg().as_f64(), 9.223372036854775807e18);
}

#[test]
fn division_by_zero() {
    assert_eq!(Numeric::Int(1).div(Numeric::Int(0)), Err(NumericError::DivisionByZero));
    assert_eq!(Numeric::Float(1.0).rem(Numeric::Float(0.0)), Err(NumericError::DivisionByZero));
}

#[test]
fn float_overflow_is_out_of_range() {
    let big = Numeric::Float(f64::MAX);
    assert_eq!(big.mul(Numeric::Int(2)), Err(NumericError::OutOfRange));
}

#[test]
fn int_and_float_compare_by_value() {
    assert_eq!(Numeric::Int(1).cmp_total(&Numeric::Float(1.0)), Ordering::Equal);
    assert_eq!(Numeric::Int(1).cmp_total(&Numeric::Float(1.5)), Ordering::Less);
    assert_eq!(Numeric::Float(f64::NAN).cmp_total(&Numeric::Int(0)), Ordering::Greater);
    assert_eq!(Numeric::Int(2), Numeric::Float(2.0));
    assert_eq!(Numeric::Int(-1).cmp_total(&Numeric::Float(-1.5)), Ordering::Greater);
    assert_eq!(Numeric::Float(f64::INFINITY).cmp_total(&Numeric::Int(i64::MAX)), Ordering::Greater);
    assert_eq!(Numeric::Float(-1e19).cmp_total(&Numeric::Int(i64::MIN)), Ordering::Less);
}

#[test]
fn large_ints_compare_exactly_against_floats() {
    let above = Numeric::Int(9_007_199_254_740_993);
    let float = Numeric::Float(9_007_199_254_740_992.0);
    assert_eq!(above.cmp_total(&float), Ordering::Greater);
    assert_eq!(float.cmp_total(&above), Ordering::Less);
    assert_eq!(Numeric::Int(9_007_199_254_740_992), float);
    assert_eq!(Numeric::Int(i64::MIN), Numeric::Float(-9_223_372_036_854_775_808.0));
}

#[test]
fn equal_numbers_share_canonical_text() {
    let pairs = [
        (Numeric::Int(9_007_199_254_740_992), Numeric::Float(9_007_199_254_740_992.0)),
        (Numeric::Int(10_000_000_000_000_000), Numeric::Float(1e16)),
        (Numeric::Int(0), Numeric::Float(-0.0)),
        (Numeric::Int(-7), Numeric::Float(-7.0)),
    ];
    for (int, float) in pairs {
        assert_eq!(int, float);
        assert_eq!(int.canonical(), float.canonical());
    }

    let int = Numeric::Int(9_007_199_254_740_993);
    let float = Numeric::Float(9_007_199_254_740_992.0);
    assert_ne!(int, float);
    assert_ne!(int.canonical(), float.canonical());
}

#[test]
fn floor_and_ceiling_produce_integers() {
    assert!(matches!(Numeric::Float(2.5).floor(), Numeric::Int(2)));
    assert!(matches!(Numeric::Float(-2.5).ceil(), Numeric::Int(-2)));
    assert!(matches!(Numeric::Float(-2.5).abs(), Numeric::Float(f) if f == 2.5));
}

#[test]
fn canonical_text_ignores_representation() {
    assert_eq!(Numeric::Int(10).canonical(), "10");
    assert_eq!(Numeric::Float(10.0).canonical(), "10");
    assert_eq!(Numeric::Float(0.25).canonical(), "0.25");
}

#[test]
fn blob_preserves_variant() {
    let int = Numeric::Int(-42);
    let float = Numeric::Float(1.0);
    let tiny = Numeric::Float(1e-300);

    assert_eq!(int.to_blob(), "-42");
    assert_eq!(float.to_blob(), "1.0");
    assert!(matches!(Numeric::from_blob(b"-42"), Some(Numeric::Int(-42))));
    assert!(matches!(Numeric::from_blob(b"1.0"), Some(Numeric::Float(f)) if f == 1.0));
    assert!(
        matches!(Numeric::from_blob(tiny.to_blob().as_bytes()), Some(Numeric::Float(f)) if f == 1e-300)
    );
    assert_eq!(Numeric::from_blob(b"abc"), None);
}

#[test]
fn deserializes_from_json_numbers() {
    let n: Numeric = serde_json::from_str("7").unwrap();
    assert!(matches!(n, Numeric::Int(7)));
    let n: Numeric = serde_json::from_str("7.5").unwrap();
    assert!(matches!(n, Numeric::Float(f) if f == 7.5));
    assert_eq!(serde_json::to_string(&Numeric::Int(3)).unwrap(), "3");
}
