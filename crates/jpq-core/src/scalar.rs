//! Owned scalars and the stable hash used by path-hash index entries.

use serde_json::Value;

use crate::{DocKind, Document, Numeric};

/// A leaf value detached from its document.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Numeric),
    String(String),
}

impl Scalar {
    /// `None` for arrays and objects.
    pub fn from_document<D: Document>(doc: &D) -> Option<Self> {
        match doc.kind() {
            DocKind::Null => Some(Scalar::Null),
            DocKind::Bool => doc.as_bool().map(Scalar::Bool),
            DocKind::Number => doc.as_number().map(Scalar::Number),
            DocKind::String => doc.as_str().map(|s| Scalar::String(s.to_string())),
            DocKind::Array | DocKind::Object => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => n.to_json(),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }
}

/// CRC-32 of `text`, prefixed with a type tag so `"1"` and `1` differ.
pub fn hash_text(tag: u8, text: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[tag]);
    hasher.update(text.as_bytes());
    hasher.finalize()
}

/// Fold `scalar` into a running path hash: `hash = rotl(hash, 1) ^ h(scalar)`.
///
/// Object keys are folded as strings.
pub fn hash_scalar(scalar: &Scalar, hash: &mut u32) {
    let value = match scalar {
        Scalar::Null => 0x01,
        Scalar::Bool(true) => 0x02,
        Scalar::Bool(false) => 0x04,
        Scalar::Number(n) => hash_text(b'n', &n.canonical()),
        Scalar::String(s) => hash_text(b's', s),
    };
    *hash = hash.rotate_left(1) ^ value;
}

/// Fold an object key into a running path hash, same as a string scalar.
pub fn hash_key(key: &str, hash: &mut u32) {
    *hash = hash.rotate_left(1) ^ hash_text(b's', key);
}
