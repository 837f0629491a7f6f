//! Human-readable node dump for debugging.
//!
//! One line per node: byte offset, tag name, `[ext]` when the external flag
//! is set, then the inline payload. Operands are indented one level below
//! their node; `next` steps stay at the node's indentation.

use std::fmt::Write as _;

use jpq_core::{Colors, DepthGuard};

use crate::query::{CompiledQuery, DecodeError, Node, NodeRef};
use crate::render::write_quoted;
use crate::tag::ANY_LAST;

/// Dump every node reachable from the root.
pub fn dump(query: &CompiledQuery, colors: Colors) -> Result<String, DecodeError> {
    let c = colors;
    let header = query.header();
    let mut out = String::new();
    writeln!(
        out,
        "{}[header]{} {} v{} externals={}",
        c.blue,
        c.reset,
        header.mode.as_str(),
        header.version,
        header.external_count
    )
    .unwrap();

    let mut ctx = DumpContext {
        query,
        colors,
        out,
        guard: DepthGuard::default(),
    };
    ctx.chain(query.root(), 0)?;
    Ok(ctx.out)
}

struct DumpContext<'q> {
    query: &'q CompiledQuery,
    colors: Colors,
    out: String,
    guard: DepthGuard,
}

impl DumpContext<'_> {
    /// A node and all its `next` steps, each at `indent`.
    fn chain(&mut self, at: NodeRef, indent: usize) -> Result<(), DecodeError> {
        self.guard.enter().map_err(|_| DecodeError::Malformed {
            offset: at.offset(),
            reason: "nesting too deep to dump",
        })?;
        let result = self.chain_inner(at, indent);
        self.guard.leave();
        result
    }

    fn chain_inner(&mut self, at: NodeRef, indent: usize) -> Result<(), DecodeError> {
        let mut cursor = Some(at);
        while let Some(at) = cursor {
            let view = self.query.view(at)?;
            let c = self.colors;

            let mut line = format!(
                "{}{:04}{} {:indent$}{}{}{}",
                c.dim,
                at.offset(),
                c.reset,
                "",
                c.blue,
                view.tag.name(),
                c.reset,
                indent = indent * 2
            );
            if view.is_external() {
                write!(line, " {}[ext]{}", c.dim, c.reset).unwrap();
            }

            let mut children: Vec<NodeRef> = Vec::new();
            let mut payload = String::new();
            match &view.node {
                Node::Null | Node::Root | Node::Last | Node::AnyKey | Node::AnyArray => {}
                Node::Method(_) | Node::Filter(_) | Node::Unary { .. } => {}
                Node::Bool(b) => payload = format!("{}{b}{}", c.yellow, c.reset),
                Node::Numeric(n) => payload = format!("{}{n}{}", c.yellow, c.reset),
                Node::String(s) => payload = self.quoted(c.green, s),
                Node::Key(k) => payload = self.quoted(c.blue, k),
                Node::Variable(name) => payload = format!("${name}"),
                Node::Current { level } => payload = format!("level={level}"),
                Node::Any { first, last } => {
                    let bound = |b: u32| {
                        if b == ANY_LAST {
                            "last".to_string()
                        } else {
                            b.to_string()
                        }
                    };
                    payload = format!("{{{} to {}}}", bound(*first), bound(*last));
                }
                Node::LikeRegex { pattern, flags, .. } => {
                    payload = self.quoted(c.green, pattern);
                    if !flags.is_empty() {
                        write!(payload, " flag={flags}").unwrap();
                    }
                }
                Node::Operator { name, cache_id, .. } => {
                    payload = format!("{name} {}#{cache_id}{}", c.dim, c.reset);
                }
                Node::Cast {
                    type_name,
                    cache_id,
                    ..
                } => {
                    payload = format!("::{type_name} {}#{cache_id}{}", c.dim, c.reset);
                }
                Node::Lambda { params, .. } => {
                    payload = format!("({})", params.clone().collect::<Vec<_>>().join(", "));
                }
                Node::HigherOrder { array, .. } if array.is_none() => {
                    payload = "method".to_string();
                }
                _ => {}
            }

            match view.node {
                Node::IndexArray(subscripts) => {
                    for (from, to) in subscripts {
                        children.push(from);
                        children.extend(to);
                    }
                }
                Node::Binary { left, right, .. } => children.extend([left, right]),
                Node::LikeRegex { expr, .. } => children.push(expr),
                Node::Unary { arg, .. } | Node::Filter(arg) | Node::Cast { arg, .. } => {
                    children.push(arg)
                }
                Node::Sequence(items) | Node::Array(items) => children.extend(items),
                Node::Operator { args, .. } => children.extend(args),
                Node::Object(pairs) => {
                    for (key, value) in pairs {
                        children.extend([key, value]);
                    }
                }
                Node::Lambda { body, .. } => children.push(body),
                Node::HigherOrder {
                    array,
                    lambda,
                    seed,
                    ..
                } => children.extend([array, seed, lambda].into_iter().flatten()),
                _ => {}
            }

            self.out.push_str(&line);
            if !payload.is_empty() {
                self.out.push(' ');
                self.out.push_str(&payload);
            }
            self.out.push('\n');

            for child in children {
                self.chain(child, indent + 1)?;
            }
            cursor = view.next;
        }
        Ok(())
    }

    fn quoted(&self, color: &str, text: &str) -> String {
        let mut quoted = String::new();
        write_quoted(&mut quoted, text);
        self.colors.paint(color, &quoted)
    }
}
