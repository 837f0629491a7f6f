//! Shorthand constructors for parse trees.
//!
//! Embedders without a text parser (and the test suites) assemble queries
//! from these; chain path steps with [`ParseNode::then`]:
//!
//! ```
//! use jpq_compiler::builder::*;
//! use jpq_bytecode::BinaryOp;
//!
//! // $.a ? (@ > 1)
//! let tree = root()
//!     .then(key("a"))
//!     .then(filter(binary(BinaryOp::Greater, current(), int(1))));
//! ```

use jpq_bytecode::{BinaryOp, HigherOrderKind, Method, RegexFlags, UnaryOp};
use jpq_core::Numeric;

use crate::parse_tree::{Member, ParseNode, PathItem, Subscript};

pub fn root() -> ParseNode {
    PathItem::Root.into()
}

/// `@` of the innermost filter or lambda.
pub fn current() -> ParseNode {
    PathItem::Current { level: None }.into()
}

/// `@N`: the item of an enclosing filter or lambda.
pub fn current_at(level: u32) -> ParseNode {
    PathItem::Current { level: Some(level) }.into()
}

pub fn key(name: &str) -> ParseNode {
    PathItem::Key {
        name: name.to_string(),
    }
    .into()
}

pub fn any_key() -> ParseNode {
    PathItem::AnyKey.into()
}

pub fn any_array() -> ParseNode {
    PathItem::AnyArray.into()
}

/// `.**{first to last}`; pass [`ANY_LAST`](jpq_bytecode::ANY_LAST) for `last`.
pub fn any(first: u32, last: u32) -> ParseNode {
    PathItem::Any { first, last }.into()
}

/// `[i, from to to, ...]`
pub fn index(subscripts: Vec<(ParseNode, Option<ParseNode>)>) -> ParseNode {
    let subscripts = subscripts
        .into_iter()
        .map(|(from, to)| Subscript { from, to })
        .collect();
    PathItem::IndexArray { subscripts }.into()
}

pub fn last() -> ParseNode {
    PathItem::Last.into()
}

pub fn null() -> ParseNode {
    PathItem::Null.into()
}

pub fn boolean(value: bool) -> ParseNode {
    PathItem::Bool { value }.into()
}

pub fn int(value: i64) -> ParseNode {
    PathItem::Numeric {
        value: Numeric::Int(value),
    }
    .into()
}

pub fn float(value: f64) -> ParseNode {
    PathItem::Numeric {
        value: Numeric::Float(value),
    }
    .into()
}

pub fn string(value: &str) -> ParseNode {
    PathItem::String {
        value: value.to_string(),
    }
    .into()
}

pub fn var(name: &str) -> ParseNode {
    PathItem::Variable {
        name: name.to_string(),
    }
    .into()
}

pub fn binary(op: BinaryOp, left: ParseNode, right: ParseNode) -> ParseNode {
    PathItem::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
    .into()
}

pub fn eq(left: ParseNode, right: ParseNode) -> ParseNode {
    binary(BinaryOp::Equal, left, right)
}

pub fn and(left: ParseNode, right: ParseNode) -> ParseNode {
    binary(BinaryOp::And, left, right)
}

pub fn or(left: ParseNode, right: ParseNode) -> ParseNode {
    binary(BinaryOp::Or, left, right)
}

pub fn unary(op: UnaryOp, arg: ParseNode) -> ParseNode {
    PathItem::Unary {
        op,
        arg: Box::new(arg),
    }
    .into()
}

pub fn not(arg: ParseNode) -> ParseNode {
    unary(UnaryOp::Not, arg)
}

pub fn exists(arg: ParseNode) -> ParseNode {
    unary(UnaryOp::Exists, arg)
}

pub fn like_regex(expr: ParseNode, pattern: &str, flags: RegexFlags) -> ParseNode {
    PathItem::LikeRegex {
        expr: Box::new(expr),
        pattern: pattern.to_string(),
        flags,
    }
    .into()
}

pub fn filter(predicate: ParseNode) -> ParseNode {
    PathItem::Filter {
        arg: Box::new(predicate),
    }
    .into()
}

pub fn method(method: Method) -> ParseNode {
    PathItem::Method { method }.into()
}

pub fn seq(items: Vec<ParseNode>) -> ParseNode {
    PathItem::Sequence { items }.into()
}

pub fn array(items: Vec<ParseNode>) -> ParseNode {
    PathItem::Array { items }.into()
}

pub fn object(members: Vec<(ParseNode, ParseNode)>) -> ParseNode {
    let members = members
        .into_iter()
        .map(|(key, value)| Member { key, value })
        .collect();
    PathItem::Object { members }.into()
}

pub fn operator(name: &str, args: Vec<ParseNode>) -> ParseNode {
    PathItem::Operator {
        name: name.to_string(),
        args,
    }
    .into()
}

pub fn cast(arg: ParseNode, type_name: &str) -> ParseNode {
    PathItem::Cast {
        arg: Box::new(arg),
        type_name: type_name.to_string(),
    }
    .into()
}

pub fn lambda(params: &[&str], body: ParseNode) -> ParseNode {
    PathItem::Lambda {
        params: params.iter().map(|p| p.to_string()).collect(),
        body: Box::new(body),
    }
    .into()
}

/// Function form: `kind(array, seed, lambda)`.
pub fn call(
    kind: HigherOrderKind,
    array: ParseNode,
    seed: Option<ParseNode>,
    lambda: Option<ParseNode>,
) -> ParseNode {
    PathItem::HigherOrder {
        kind,
        array: Some(Box::new(array)),
        lambda: lambda.map(Box::new),
        seed: seed.map(Box::new),
    }
    .into()
}

/// Method form: `.kind(seed, lambda)` applied to the preceding step.
pub fn method_call(
    kind: HigherOrderKind,
    seed: Option<ParseNode>,
    lambda: Option<ParseNode>,
) -> ParseNode {
    PathItem::HigherOrder {
        kind,
        array: None,
        lambda: lambda.map(Box::new),
        seed: seed.map(Box::new),
    }
    .into()
}
