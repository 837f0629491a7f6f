//! Numbers as seen by queries: exact integers with a float fallback.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric value out of range")]
    OutOfRange,
}

/// A query number. Integer arithmetic that overflows continues in `f64`.
#[derive(Clone, Copy, Debug)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    /// Integral floats that fit an `i64` become [`Numeric::Int`].
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Numeric::Int(value as i64)
        } else {
            Numeric::Float(value)
        }
    }

    pub fn from_json(number: &serde_json::Number) -> Self {
        if let Some(i) = number.as_i64() {
            Numeric::Int(i)
        } else if let Some(u) = number.as_u64() {
            Numeric::Float(u as f64)
        } else {
            Numeric::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    pub fn to_json(self) -> serde_json::Value {
        match self {
            Numeric::Int(i) => serde_json::Value::from(i),
            Numeric::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Truncating conversion used by array subscripts.
    pub fn trunc_i64(self) -> Option<i64> {
        match self {
            Numeric::Int(i) => Some(i),
            Numeric::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Some(f.trunc() as i64),
            Numeric::Float(_) => None,
        }
    }

    /// Total order: numbers compare by exact value, NaN sorts after everything.
    ///
    /// Two numbers are equal exactly when their [`canonical`](Self::canonical)
    /// texts are equal.
    pub fn cmp_total(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
            (Numeric::Int(a), Numeric::Float(b)) => cmp_int_float(a, b),
            (Numeric::Float(a), Numeric::Int(b)) => cmp_int_float(b, a).reverse(),
            (Numeric::Float(a), Numeric::Float(b)) => {
                a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
            }
        }
    }

    pub fn add(self, other: Self) -> Result<Self, NumericError> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(a
                .checked_add(b)
                .map_or_else(|| Numeric::Float(a as f64 + b as f64), Numeric::Int)),
            _ => finite(self.as_f64() + other.as_f64()),
        }
    }

    pub fn sub(self, other: Self) -> Result<Self, NumericError> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(a
                .checked_sub(b)
                .map_or_else(|| Numeric::Float(a as f64 - b as f64), Numeric::Int)),
            _ => finite(self.as_f64() - other.as_f64()),
        }
    }

    pub fn mul(self, other: Self) -> Result<Self, NumericError> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(a
                .checked_mul(b)
                .map_or_else(|| Numeric::Float(a as f64 * b as f64), Numeric::Int)),
            _ => finite(self.as_f64() * other.as_f64()),
        }
    }

    pub fn div(self, other: Self) -> Result<Self, NumericError> {
        if other.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) if a.checked_rem(b) == Some(0) => {
                Ok(a.checked_div(b).map_or(Numeric::Float(a as f64 / b as f64), Numeric::Int))
            }
            _ => finite(self.as_f64() / other.as_f64()),
        }
    }

    pub fn rem(self, other: Self) -> Result<Self, NumericError> {
        if other.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Ok(Numeric::Int(a.checked_rem(b).unwrap_or(0))),
            _ => finite(self.as_f64() % other.as_f64()),
        }
    }

    pub fn neg(self) -> Self {
        match self {
            Numeric::Int(i) => i
                .checked_neg()
                .map_or(Numeric::Float(-(i as f64)), Numeric::Int),
            Numeric::Float(f) => Numeric::Float(-f),
        }
    }

    pub fn abs(self) -> Self {
        match self {
            Numeric::Int(i) => i
                .checked_abs()
                .map_or(Numeric::Float((i as f64).abs()), Numeric::Int),
            Numeric::Float(f) => Numeric::Float(f.abs()),
        }
    }

    pub fn floor(self) -> Self {
        match self {
            Numeric::Int(_) => self,
            Numeric::Float(f) => Numeric::from_f64(f.floor()),
        }
    }

    pub fn ceil(self) -> Self {
        match self {
            Numeric::Int(_) => self,
            Numeric::Float(f) => Numeric::from_f64(f.ceil()),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Numeric::Int(i) => i == 0,
            Numeric::Float(f) => f == 0.0,
        }
    }

    /// Text used for hashing and index entries: `1` and `1.0` agree.
    pub fn canonical(&self) -> String {
        match *self {
            Numeric::Int(i) => i.to_string(),
            Numeric::Float(f) => match Numeric::from_f64(f) {
                Numeric::Int(i) => i.to_string(),
                Numeric::Float(f) => f.to_string(),
            },
        }
    }

    /// Opaque payload stored in compiled queries.
    ///
    /// Integers are plain decimal; floats use the shortest round-trip form,
    /// which always carries a `.`, an exponent, `inf` or `NaN`.
    pub fn to_blob(&self) -> String {
        match self {
            Numeric::Int(i) => i.to_string(),
            Numeric::Float(f) => format!("{f:?}"),
        }
    }

    pub fn from_blob(blob: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(blob).ok()?;
        if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
            text.parse::<i64>().ok().map(Numeric::Int)
        } else {
            text.parse::<f64>().ok().map(Numeric::Float)
        }
    }
}

/// `i` against `f` without rounding `i` to `f64`.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // in range, so the cast is exact
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

fn finite(value: f64) -> Result<Numeric, NumericError> {
    if value.is_finite() {
        Ok(Numeric::Float(value))
    } else {
        Err(NumericError::OutOfRange)
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_total(other) == Ordering::Equal
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{i}"),
            Numeric::Float(x) => write!(f, "{x}"),
        }
    }
}

impl Serialize for Numeric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Numeric::Int(i) => serializer.serialize_i64(i),
            Numeric::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumericVisitor;

        impl Visitor<'_> for NumericVisitor {
            type Value = Numeric;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Numeric, E> {
                Ok(Numeric::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Numeric, E> {
                Ok(i64::try_from(v).map_or(Numeric::Float(v as f64), Numeric::Int))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Numeric, E> {
                Ok(Numeric::Float(v))
            }
        }

        deserializer.deserialize_any(NumericVisitor)
    }
}
