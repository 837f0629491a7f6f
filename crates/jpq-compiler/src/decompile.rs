//! Compiled query back to a parse tree.
//!
//! `@` comes back with its resolved level and `$` inside a lambda body comes
//! back as `@N`, so the tree may differ from the one originally encoded, but
//! encoding it again reproduces the same bytes.

use jpq_bytecode::{CompiledQuery, DecodeError, Node, NodeRef};
use jpq_core::DepthGuard;

use crate::parse_tree::{Member, ParseNode, PathItem, Subscript};

pub fn to_parse_tree(query: &CompiledQuery) -> Result<ParseNode, DecodeError> {
    let mut d = Decompiler {
        query,
        guard: DepthGuard::default(),
    };
    d.node(query.root())
}

struct Decompiler<'q> {
    query: &'q CompiledQuery,
    guard: DepthGuard,
}

impl Decompiler<'_> {
    fn node(&mut self, at: NodeRef) -> Result<ParseNode, DecodeError> {
        self.guard.enter().map_err(|_| DecodeError::Malformed {
            offset: at.offset(),
            reason: "nesting too deep to decompile",
        })?;
        let result = self.node_inner(at);
        self.guard.leave();
        result
    }

    fn boxed(&mut self, at: NodeRef) -> Result<Box<ParseNode>, DecodeError> {
        self.node(at).map(Box::new)
    }

    fn optional(&mut self, at: Option<NodeRef>) -> Result<Option<Box<ParseNode>>, DecodeError> {
        at.map(|at| self.boxed(at)).transpose()
    }

    fn list(&mut self, refs: impl Iterator<Item = NodeRef>) -> Result<Vec<ParseNode>, DecodeError> {
        refs.map(|at| self.node(at)).collect()
    }

    fn node_inner(&mut self, at: NodeRef) -> Result<ParseNode, DecodeError> {
        let view = self.query.view(at)?;
        let item = match view.node {
            Node::Null => PathItem::Null,
            Node::Bool(value) => PathItem::Bool { value },
            Node::Numeric(value) => PathItem::Numeric { value },
            Node::String(value) => PathItem::String {
                value: value.to_string(),
            },
            Node::Key(name) => PathItem::Key {
                name: name.to_string(),
            },
            Node::Current { level } => PathItem::Current { level: Some(level) },
            Node::Root => PathItem::Root,
            Node::Variable(name) => PathItem::Variable {
                name: name.to_string(),
            },
            Node::Last => PathItem::Last,
            Node::AnyKey => PathItem::AnyKey,
            Node::AnyArray => PathItem::AnyArray,
            Node::IndexArray(subscripts) => {
                let mut out = Vec::with_capacity(subscripts.len());
                for (from, to) in subscripts {
                    out.push(Subscript {
                        from: self.node(from)?,
                        to: to.map(|to| self.node(to)).transpose()?,
                    });
                }
                PathItem::IndexArray { subscripts: out }
            }
            Node::Any { first, last } => PathItem::Any { first, last },
            Node::Binary { op, left, right } => PathItem::Binary {
                op,
                left: self.boxed(left)?,
                right: self.boxed(right)?,
            },
            Node::LikeRegex {
                expr,
                pattern,
                flags,
            } => PathItem::LikeRegex {
                expr: self.boxed(expr)?,
                pattern: pattern.to_string(),
                flags,
            },
            Node::Unary { op, arg } => PathItem::Unary {
                op,
                arg: self.boxed(arg)?,
            },
            Node::Filter(arg) => PathItem::Filter {
                arg: self.boxed(arg)?,
            },
            Node::Method(method) => PathItem::Method { method },
            Node::Sequence(items) => PathItem::Sequence {
                items: self.list(items)?,
            },
            Node::Array(items) => PathItem::Array {
                items: self.list(items)?,
            },
            Node::Object(pairs) => {
                let mut members = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    members.push(Member {
                        key: self.node(key)?,
                        value: self.node(value)?,
                    });
                }
                PathItem::Object { members }
            }
            Node::Operator { name, args, .. } => PathItem::Operator {
                name: name.to_string(),
                args: self.list(args)?,
            },
            Node::Cast { arg, type_name, .. } => PathItem::Cast {
                arg: self.boxed(arg)?,
                type_name: type_name.to_string(),
            },
            Node::Lambda { params, body } => PathItem::Lambda {
                params: params.map(str::to_string).collect(),
                body: self.boxed(body)?,
            },
            Node::HigherOrder {
                kind,
                array,
                lambda,
                seed,
            } => PathItem::HigherOrder {
                kind,
                array: self.optional(array)?,
                lambda: self.optional(lambda)?,
                seed: self.optional(seed)?,
            },
        };

        let next = self.optional(view.next)?;
        Ok(ParseNode { item, next })
    }
}
