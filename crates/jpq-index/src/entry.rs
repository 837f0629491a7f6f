//! Index entries and the boolean formulas built over them.

use std::fmt;

use jpq_core::{Scalar, hash_text};
use serde::{Deserialize, Serialize};

/// Texts longer than this are stored as a hash.
pub const MAX_TEXT_LEN: usize = 125;

/// How documents are reduced to entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// Every key and every scalar is its own entry. Supports existence checks.
    #[default]
    FullKey,
    /// One hash per scalar, folding in the keys on its path.
    HashChain,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::FullKey => "full-key",
            Scheme::HashChain => "hash-chain",
        }
    }
}

/// Which evaluator entry point the index answers for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// `Evaluator::matches`: a predicate query must come out `true`.
    #[default]
    Match,
    /// `Evaluator::exists`: the query must yield at least one item.
    Exists,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Match => "match",
            Strategy::Exists => "exists",
        }
    }
}

/// Key or string payload of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Text {
    Plain(String),
    Hashed(u32),
}

impl Text {
    pub fn new(text: &str) -> Self {
        if text.len() > MAX_TEXT_LEN {
            Text::Hashed(hash_text(b't', text))
        } else {
            Text::Plain(text.to_string())
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Text::Plain(text) => write!(f, "{text:?}"),
            Text::Hashed(hash) => write!(f, "#{hash:08x}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Entry {
    /// Object key, or a string array element under [`Scheme::FullKey`].
    Key(Text),
    Null,
    Bool(bool),
    /// Canonical number text, so `1` and `1.0` share an entry.
    Number(Text),
    String(Text),
    /// [`Scheme::HashChain`] entry.
    PathHash(u32),
}

impl Entry {
    pub fn key(key: &str) -> Self {
        Entry::Key(Text::new(key))
    }

    /// Full-key entry for a scalar stored as a value.
    pub fn value(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Entry::Null,
            Scalar::Bool(b) => Entry::Bool(*b),
            Scalar::Number(n) => Entry::Number(Text::new(&n.canonical())),
            Scalar::String(s) => Entry::String(Text::new(s)),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Key(text) => write!(f, "key {text}"),
            Entry::Null => f.write_str("null"),
            Entry::Bool(b) => write!(f, "bool {b}"),
            Entry::Number(text) => match text {
                Text::Plain(n) => write!(f, "number {n}"),
                Text::Hashed(_) => write!(f, "number {text}"),
            },
            Entry::String(text) => write!(f, "string {text}"),
            Entry::PathHash(hash) => write!(f, "path #{hash:08x}"),
        }
    }
}

/// Formula over entry indices. `Entry(i)` is true when the document holds
/// the `i`-th entry of the query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolTree {
    And(Vec<BoolTree>),
    Or(Vec<BoolTree>),
    Entry(usize),
}

impl BoolTree {
    /// Conjunction of `args`, flattening nested conjunctions and dropping
    /// repeated arguments.
    pub fn and(args: Vec<BoolTree>) -> Self {
        Self::combine(args, true)
    }

    /// Disjunction of `args`, flattening nested disjunctions.
    pub fn or(args: Vec<BoolTree>) -> Self {
        Self::combine(args, false)
    }

    fn combine(args: Vec<BoolTree>, is_and: bool) -> Self {
        let mut flat: Vec<BoolTree> = Vec::with_capacity(args.len());
        let mut push = |arg: BoolTree| {
            if !flat.contains(&arg) {
                flat.push(arg);
            }
        };
        for arg in args {
            match arg {
                BoolTree::And(inner) if is_and => inner.into_iter().for_each(&mut push),
                BoolTree::Or(inner) if !is_and => inner.into_iter().for_each(&mut push),
                other => push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        if is_and {
            BoolTree::And(flat)
        } else {
            BoolTree::Or(flat)
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        let (args, sep) = match self {
            BoolTree::Entry(index) => return write!(f, "#{index}"),
            BoolTree::And(args) => (args, " && "),
            BoolTree::Or(args) => (args, " || "),
        };
        if nested {
            f.write_str("(")?;
        }
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            arg.fmt_nested(f, true)?;
        }
        if nested {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for BoolTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}
