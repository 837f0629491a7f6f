//! Parse tree handed to the encoder by an external parser.
//!
//! A path expression is a chain of [`ParseNode`]s linked through `next`;
//! operands are nested trees of their own. The serde form is the JSON the
//! `jpq compile` command reads:
//!
//! ```json
//! {"type": "root", "next": {"type": "key", "name": "a"}}
//! ```

use jpq_bytecode::{ANY_LAST, BinaryOp, HigherOrderKind, Method, RegexFlags, UnaryOp};
use jpq_core::Numeric;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseNode {
    #[serde(flatten)]
    pub item: PathItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<ParseNode>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathItem {
    Null,
    Bool {
        value: bool,
    },
    Numeric {
        value: Numeric,
    },
    String {
        value: String,
    },
    Key {
        name: String,
    },
    /// `@`; without a level it refers to the innermost filter or lambda.
    Current {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
    },
    Root,
    Variable {
        name: String,
    },
    Last,
    AnyKey,
    AnyArray,
    IndexArray {
        subscripts: Vec<Subscript>,
    },
    Any {
        #[serde(default)]
        first: u32,
        #[serde(default = "any_last")]
        last: u32,
    },
    Binary {
        op: BinaryOp,
        left: Box<ParseNode>,
        right: Box<ParseNode>,
    },
    LikeRegex {
        expr: Box<ParseNode>,
        pattern: String,
        #[serde(default, skip_serializing_if = "no_flags")]
        flags: RegexFlags,
    },
    Unary {
        op: UnaryOp,
        arg: Box<ParseNode>,
    },
    Filter {
        arg: Box<ParseNode>,
    },
    Method {
        method: Method,
    },
    Sequence {
        items: Vec<ParseNode>,
    },
    Array {
        items: Vec<ParseNode>,
    },
    Object {
        members: Vec<Member>,
    },
    Operator {
        name: String,
        args: Vec<ParseNode>,
    },
    Cast {
        arg: Box<ParseNode>,
        type_name: String,
    },
    Lambda {
        params: Vec<String>,
        body: Box<ParseNode>,
    },
    /// Function form when `array` is present, method form (`.map(...)`) otherwise.
    HigherOrder {
        kind: HigherOrderKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        array: Option<Box<ParseNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lambda: Option<Box<ParseNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<Box<ParseNode>>,
    },
}

fn any_last() -> u32 {
    ANY_LAST
}

fn no_flags(flags: &RegexFlags) -> bool {
    flags.is_empty()
}

/// `from` or `from to to` inside `[...]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscript {
    pub from: ParseNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ParseNode>,
}

/// `key: value` of an object constructor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub key: ParseNode,
    pub value: ParseNode,
}

impl From<PathItem> for ParseNode {
    fn from(item: PathItem) -> Self {
        Self { item, next: None }
    }
}

impl ParseNode {
    pub fn new(item: PathItem) -> Self {
        item.into()
    }

    /// Append `step` (and its own chain) after the last step of this chain.
    pub fn then(mut self, step: impl Into<ParseNode>) -> Self {
        self.push_tail(step.into());
        self
    }

    fn push_tail(&mut self, step: ParseNode) {
        match &mut self.next {
            Some(next) => next.push_tail(step),
            None => self.next = Some(Box::new(step)),
        }
    }

    /// Steps of this chain, starting with `self`.
    pub fn steps(&self) -> impl Iterator<Item = &ParseNode> {
        std::iter::successors(Some(self), |node| node.next.as_deref())
    }

    /// Whether the chain head evaluates to a truth value.
    pub fn is_predicate(&self) -> bool {
        match &self.item {
            PathItem::Binary { op, .. } => {
                op.is_comparison() || op.is_logical() || *op == BinaryOp::StartsWith
            }
            PathItem::Unary { op, .. } => {
                matches!(op, UnaryOp::Not | UnaryOp::Exists | UnaryOp::IsUnknown)
            }
            PathItem::LikeRegex { .. } => true,
            _ => false,
        }
    }
}
