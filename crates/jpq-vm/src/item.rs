//! Items produced and consumed during evaluation.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use jpq_core::{Datetime, DocKind, Document, Numeric, Scalar};

/// One evaluation item: a node of the input document, or a value computed
/// by the query (literals, arithmetic, constructors, item methods).
pub enum Item<'a, D> {
    Node(&'a D),
    Null,
    Bool(bool),
    Number(Numeric),
    String(String),
    DateTime(Datetime),
    Array(Vec<Item<'a, D>>),
    /// Object with members in construction order.
    Object(Vec<(String, Item<'a, D>)>),
}

impl<D> Clone for Item<'_, D> {
    fn clone(&self) -> Self {
        match self {
            Item::Node(d) => Item::Node(*d),
            Item::Null => Item::Null,
            Item::Bool(b) => Item::Bool(*b),
            Item::Number(n) => Item::Number(*n),
            Item::String(s) => Item::String(s.clone()),
            Item::DateTime(dt) => Item::DateTime(*dt),
            Item::Array(items) => Item::Array(items.clone()),
            Item::Object(members) => Item::Object(members.clone()),
        }
    }
}

impl<D: Document> fmt::Debug for Item<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Uniform view over document and computed items.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Shape<'i> {
    Null,
    Bool(bool),
    Number(Numeric),
    String(&'i str),
    DateTime(Datetime),
    Array,
    Object,
}

impl<'a, D: Document> Item<'a, D> {
    pub(crate) fn shape(&self) -> Shape<'_> {
        match self {
            Item::Node(d) => match d.kind() {
                DocKind::Null => Shape::Null,
                DocKind::Bool => Shape::Bool(d.as_bool().unwrap_or_default()),
                DocKind::Number => d.as_number().map_or(Shape::Null, Shape::Number),
                DocKind::String => Shape::String(d.as_str().unwrap_or_default()),
                DocKind::Array => Shape::Array,
                DocKind::Object => Shape::Object,
            },
            Item::Null => Shape::Null,
            Item::Bool(b) => Shape::Bool(*b),
            Item::Number(n) => Shape::Number(*n),
            Item::String(s) => Shape::String(s),
            Item::DateTime(dt) => Shape::DateTime(*dt),
            Item::Array(_) => Shape::Array,
            Item::Object(_) => Shape::Object,
        }
    }

    pub fn from_scalar(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Item::Null,
            Scalar::Bool(b) => Item::Bool(b),
            Scalar::Number(n) => Item::Number(n),
            Scalar::String(s) => Item::String(s),
        }
    }

    /// Detach a scalar item; datetimes become their ISO text.
    pub fn to_scalar(&self) -> Option<Scalar> {
        Some(match self.shape() {
            Shape::Null => Scalar::Null,
            Shape::Bool(b) => Scalar::Bool(b),
            Shape::Number(n) => Scalar::Number(n),
            Shape::String(s) => Scalar::String(s.to_string()),
            Shape::DateTime(dt) => Scalar::String(dt.to_iso()),
            Shape::Array | Shape::Object => return None,
        })
    }

    pub fn is_array(&self) -> bool {
        self.shape() == Shape::Array
    }

    pub fn is_object(&self) -> bool {
        self.shape() == Shape::Object
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.shape() {
            Shape::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Numeric> {
        match self.shape() {
            Shape::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.shape() {
            Shape::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name reported by `.type()`.
    pub fn type_name(&self) -> &'static str {
        match self.shape() {
            Shape::Null => "null",
            Shape::Bool(_) => "boolean",
            Shape::Number(_) => "number",
            Shape::String(_) => "string",
            Shape::DateTime(dt) => dt.type_name(),
            Shape::Array => "array",
            Shape::Object => "object",
        }
    }

    /// Element count of an array item.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Item::Node(d) if d.kind() == DocKind::Array => Some(d.len()),
            Item::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Elements of an array item; empty for anything else.
    pub(crate) fn elements(&self) -> Vec<Item<'a, D>> {
        match self {
            Item::Node(d) if d.kind() == DocKind::Array => {
                let d: &'a D = *d;
                d.members().map(|(_, v)| Item::Node(v)).collect()
            }
            Item::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn element(&self, index: usize) -> Option<Item<'a, D>> {
        match self {
            Item::Node(d) => {
                let d: &'a D = *d;
                d.get_index(index).map(Item::Node)
            }
            Item::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Members of an object item; empty for anything else.
    pub(crate) fn entries(&self) -> Vec<(String, Item<'a, D>)> {
        match self {
            Item::Node(d) if d.kind() == DocKind::Object => {
                let d: &'a D = *d;
                d.members()
                    .map(|(k, v)| (k.unwrap_or_default().to_string(), Item::Node(v)))
                    .collect()
            }
            Item::Object(members) => members.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn member(&self, key: &str) -> Option<Item<'a, D>> {
        match self {
            Item::Node(d) => {
                let d: &'a D = *d;
                d.get(key).map(Item::Node)
            }
            Item::Object(members) => members
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Item::Node(d) => d.to_json(),
            Item::Null => Value::Null,
            Item::Bool(b) => Value::Bool(*b),
            Item::Number(n) => n.to_json(),
            Item::String(s) => Value::String(s.clone()),
            Item::DateTime(dt) => Value::String(dt.to_iso()),
            Item::Array(items) => Value::Array(items.iter().map(Item::to_json).collect()),
            Item::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl<D: Document> Serialize for Item<'_, D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}
