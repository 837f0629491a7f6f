//! The document abstraction queries run against.
//!
//! Evaluation needs random access (`get`, `get_index`); index building needs
//! one ordered pass over everything, which [`tokens`] provides without
//! recursion so deep documents cannot overflow the stack.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::Numeric;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// Read-only view of a tree-shaped document node.
pub trait Document {
    fn kind(&self) -> DocKind;

    fn as_bool(&self) -> Option<bool>;

    fn as_number(&self) -> Option<Numeric>;

    fn as_str(&self) -> Option<&str>;

    /// Number of elements or members; zero for scalars.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object member lookup.
    fn get(&self, key: &str) -> Option<&Self>;

    /// Array element lookup.
    fn get_index(&self, index: usize) -> Option<&Self>;

    /// Children in document order: `(Some(key), value)` for objects,
    /// `(None, element)` for arrays.
    fn members(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Self)> + '_>;

    fn to_json(&self) -> Value
    where
        Self: Sized,
    {
        match self.kind() {
            DocKind::Null => Value::Null,
            DocKind::Bool => Value::Bool(self.as_bool().unwrap_or_default()),
            DocKind::Number => self.as_number().map_or(Value::Null, Numeric::to_json),
            DocKind::String => Value::String(self.as_str().unwrap_or_default().to_string()),
            DocKind::Array => Value::Array(self.members().map(|(_, v)| v.to_json()).collect()),
            DocKind::Object => Value::Object(
                self.members()
                    .map(|(k, v)| (k.unwrap_or_default().to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Document for Value {
    fn kind(&self) -> DocKind {
        match self {
            Value::Null => DocKind::Null,
            Value::Bool(_) => DocKind::Bool,
            Value::Number(_) => DocKind::Number,
            Value::String(_) => DocKind::String,
            Value::Array(_) => DocKind::Array,
            Value::Object(_) => DocKind::Object,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        Value::as_bool(self)
    }

    fn as_number(&self) -> Option<Numeric> {
        match self {
            Value::Number(n) => Some(Numeric::from_json(n)),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn get(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn members(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Self)> + '_> {
        match self {
            Value::Array(items) => Box::new(items.iter().map(|v| (None, v))),
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (Some(k.as_str()), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn to_json(&self) -> Value
    where
        Self: Sized,
    {
        self.clone()
    }
}

/// Named values a query can reference as `$name`.
pub trait Variables<D> {
    fn lookup(&self, name: &str) -> Option<&D>;
}

impl<D> Variables<D> for HashMap<String, D> {
    fn lookup(&self, name: &str) -> Option<&D> {
        self.get(name)
    }
}

impl<D> Variables<D> for BTreeMap<String, D> {
    fn lookup(&self, name: &str) -> Option<&D> {
        self.get(name)
    }
}

impl Variables<Value> for serde_json::Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// One step of a depth-first document walk.
#[derive(Debug)]
pub enum Token<'a, D> {
    BeginArray(usize),
    BeginObject(usize),
    Key(&'a str),
    /// Scalar object member value, or a scalar document root.
    Value(&'a D),
    /// Scalar array element.
    Elem(&'a D),
    EndArray,
    EndObject,
}

impl<D> Clone for Token<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Token<'_, D> {}

struct Frame<'a, D> {
    is_array: bool,
    members: Box<dyn Iterator<Item = (Option<&'a str>, &'a D)> + 'a>,
    pending: Option<&'a D>,
}

/// Iterator returned by [`tokens`].
pub struct Tokens<'a, D> {
    root: Option<&'a D>,
    stack: Vec<Frame<'a, D>>,
}

/// Walk `doc` as a flat token stream.
///
/// Containers appear as `Begin*`/`End*` pairs; a container that is an object
/// member value follows its `Key` directly, without a `Value` token.
pub fn tokens<D: Document>(doc: &D) -> Tokens<'_, D> {
    Tokens {
        root: Some(doc),
        stack: Vec::new(),
    }
}

impl<'a, D: Document> Tokens<'a, D> {
    fn enter(&mut self, node: &'a D, scalar: fn(&'a D) -> Token<'a, D>) -> Token<'a, D> {
        let (is_array, token) = match node.kind() {
            DocKind::Array => (true, Token::BeginArray(node.len())),
            DocKind::Object => (false, Token::BeginObject(node.len())),
            _ => return scalar(node),
        };
        self.stack.push(Frame {
            is_array,
            members: node.members(),
            pending: None,
        });
        token
    }
}

impl<'a, D: Document> Iterator for Tokens<'a, D> {
    type Item = Token<'a, D>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            return Some(self.enter(root, Token::Value));
        }
        let frame = self.stack.last_mut()?;
        if let Some(value) = frame.pending.take() {
            return Some(self.enter(value, Token::Value));
        }
        match frame.members.next() {
            Some((Some(key), value)) => {
                frame.pending = Some(value);
                Some(Token::Key(key))
            }
            Some((None, elem)) => Some(self.enter(elem, Token::Elem)),
            None => {
                let frame = self.stack.pop()?;
                Some(if frame.is_array {
                    Token::EndArray
                } else {
                    Token::EndObject
                })
            }
        }
    }
}
