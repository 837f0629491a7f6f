//! Canonical text form of a compiled query.
//!
//! Keys and strings are always double-quoted, operands are parenthesized
//! whenever their operator binds no tighter than the parent's, and `@`
//! carries an explicit level only when it does not refer to the innermost
//! filter or lambda.

use std::fmt::{self, Write as _};

use jpq_core::DepthGuard;

use crate::query::{CompiledQuery, DecodeError, Node, NodeRef};
use crate::tag::{ANY_LAST, Tag, UnaryOp};

/// Render `query` back to path text.
pub fn render(query: &CompiledQuery) -> Result<String, DecodeError> {
    let mut r = Renderer {
        query,
        out: String::new(),
        level: 0,
        guard: DepthGuard::default(),
    };
    if !query.is_lax() {
        r.out.push_str("strict ");
    }
    r.item(query.root(), false, false)?;
    Ok(r.out)
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self).map_err(|_| fmt::Error)?)
    }
}

/// Binding strength of an operator node; 6 for everything that is not one.
fn priority(tag: Tag) -> u8 {
    match tag {
        Tag::Binary(op) => op.precedence(),
        Tag::Unary(UnaryOp::Plus | UnaryOp::Minus) => 5,
        _ => 6,
    }
}

fn is_operation(tag: Tag) -> bool {
    matches!(tag, Tag::Binary(_) | Tag::LikeRegex)
        || matches!(tag, Tag::Unary(UnaryOp::Plus | UnaryOp::Minus))
}

/// Double-quoted with JSON escapes.
pub(crate) fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct Renderer<'q> {
    query: &'q CompiledQuery,
    out: String,
    /// Item stack level `@` resolves to without an explicit number.
    level: u32,
    guard: DepthGuard,
}

impl Renderer<'_> {
    /// `chained`: the node follows another path step. `bracket`: the parent
    /// wants operator nodes parenthesized.
    fn item(&mut self, at: NodeRef, chained: bool, bracket: bool) -> Result<(), DecodeError> {
        self.guard.enter().map_err(|_| DecodeError::Malformed {
            offset: at.offset(),
            reason: "nesting too deep to render",
        })?;
        let result = self.item_inner(at, chained, bracket);
        self.guard.leave();
        result
    }

    fn item_inner(&mut self, at: NodeRef, chained: bool, bracket: bool) -> Result<(), DecodeError> {
        let view = self.query.view(at)?;
        let bracket = bracket || (view.next.is_some() && is_operation(view.tag));

        match view.node {
            Node::Null => self.out.push_str("null"),
            Node::Bool(b) => self.out.push_str(if b { "true" } else { "false" }),
            Node::Numeric(n) => {
                let _ = write!(self.out, "{n}");
            }
            Node::String(s) => write_quoted(&mut self.out, s),
            Node::Key(k) => {
                if chained {
                    self.out.push('.');
                }
                write_quoted(&mut self.out, k);
            }
            Node::Current { level } => {
                self.out.push('@');
                if level != self.level {
                    let _ = write!(self.out, "{level}");
                }
            }
            Node::Root => self.out.push('$'),
            Node::Variable(name) => {
                self.out.push('$');
                if is_identifier(name) {
                    self.out.push_str(name);
                } else {
                    write_quoted(&mut self.out, name);
                }
            }
            Node::Last => self.out.push_str("last"),
            Node::AnyKey => {
                if chained {
                    self.out.push('.');
                }
                self.out.push('*');
            }
            Node::AnyArray => self.out.push_str("[*]"),
            Node::IndexArray(subscripts) => {
                self.out.push('[');
                for (i, (from, to)) in subscripts.enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.item(from, false, false)?;
                    if let Some(to) = to {
                        self.out.push_str(" to ");
                        self.item(to, false, false)?;
                    }
                }
                self.out.push(']');
            }
            Node::Any { first, last } => {
                if chained {
                    self.out.push('.');
                }
                self.out.push_str("**");
                let bound = |b: u32| {
                    if b == ANY_LAST {
                        "last".to_string()
                    } else {
                        b.to_string()
                    }
                };
                if first == last {
                    let _ = write!(self.out, "{{{}}}", bound(first));
                } else if !(first == 0 && last == ANY_LAST) {
                    let _ = write!(self.out, "{{{} to {}}}", bound(first), bound(last));
                }
            }
            Node::Binary { op, left, right } => {
                if bracket {
                    self.out.push('(');
                }
                let parent = priority(view.tag);
                self.operand(left, parent)?;
                let _ = write!(self.out, " {} ", op.as_str());
                self.operand(right, parent)?;
                if bracket {
                    self.out.push(')');
                }
            }
            Node::LikeRegex {
                expr,
                pattern,
                flags,
            } => {
                if bracket {
                    self.out.push('(');
                }
                self.operand(expr, priority(view.tag))?;
                self.out.push_str(" like_regex ");
                write_quoted(&mut self.out, pattern);
                if !flags.is_empty() {
                    let _ = write!(self.out, " flag \"{flags}\"");
                }
                if bracket {
                    self.out.push(')');
                }
            }
            Node::Unary { op, arg } => match op {
                UnaryOp::Not => {
                    self.out.push_str("!(");
                    self.item(arg, false, false)?;
                    self.out.push(')');
                }
                UnaryOp::Exists => {
                    self.out.push_str("exists (");
                    self.item(arg, false, false)?;
                    self.out.push(')');
                }
                UnaryOp::IsUnknown => {
                    self.out.push('(');
                    self.item(arg, false, false)?;
                    self.out.push_str(") is unknown");
                }
                UnaryOp::Plus | UnaryOp::Minus => {
                    if bracket {
                        self.out.push('(');
                    }
                    self.out.push(if op == UnaryOp::Plus { '+' } else { '-' });
                    self.operand(arg, priority(view.tag))?;
                    if bracket {
                        self.out.push(')');
                    }
                }
            },
            Node::Filter(arg) => {
                self.out.push_str("?(");
                self.nested(|r| r.item(arg, false, false))?;
                self.out.push(')');
            }
            Node::Method(method) => {
                let _ = write!(self.out, ".{}()", method.as_str());
            }
            Node::Sequence(items) => {
                self.out.push('(');
                self.list(items)?;
                self.out.push(')');
            }
            Node::Array(items) => {
                self.out.push('[');
                self.list(items)?;
                self.out.push(']');
            }
            Node::Object(pairs) => {
                self.out.push('{');
                for (i, (key, value)) in pairs.enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.item(key, false, false)?;
                    self.out.push_str(": ");
                    self.item(value, false, false)?;
                }
                self.out.push('}');
            }
            Node::Operator { name, args, .. } => {
                let _ = write!(self.out, "{name}(");
                self.list(args)?;
                self.out.push(')');
            }
            Node::Cast { arg, type_name, .. } => {
                let wrap = is_operation(self.query.view(arg)?.tag);
                self.item(arg, false, wrap)?;
                let _ = write!(self.out, "::{type_name}");
            }
            Node::Lambda { params, body } => {
                self.out.push('(');
                for (i, name) in params.enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(name);
                }
                self.out.push_str(") => ");
                self.nested(|r| r.item(body, false, false))?;
            }
            Node::HigherOrder {
                kind,
                array,
                lambda,
                seed,
            } => {
                let mut first = true;
                if let Some(array) = array {
                    let _ = write!(self.out, "{}(", kind.as_str());
                    self.item(array, false, false)?;
                    first = false;
                } else {
                    let _ = write!(self.out, ".{}(", kind.as_str());
                }
                for arg in [seed, lambda].into_iter().flatten() {
                    if !first {
                        self.out.push_str(", ");
                    }
                    self.item(arg, false, false)?;
                    first = false;
                }
                self.out.push(')');
            }
        }

        if let Some(next) = view.next {
            self.item(next, true, true)?;
        }
        Ok(())
    }

    fn operand(&mut self, at: NodeRef, parent: u8) -> Result<(), DecodeError> {
        let tag = self.query.view(at)?.tag;
        self.item(at, false, priority(tag) <= parent)
    }

    fn list(&mut self, items: impl Iterator<Item = NodeRef>) -> Result<(), DecodeError> {
        for (i, at) in items.enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.item(at, false, false)?;
        }
        Ok(())
    }

    /// Run `f` one item stack level deeper (filter predicate, lambda body).
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        self.level += 1;
        let result = f(self);
        self.level -= 1;
        result
    }
}
