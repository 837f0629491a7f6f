//! Tracing hooks for debugging evaluation.
//!
//! The evaluator is generic over the tracer, so [`NoopTracer`] calls are
//! optimized away entirely. [`PrintTracer`] collects one line per event.

use std::fmt::Write as _;

use jpq_bytecode::{Node, NodeRef, NodeView};
use jpq_core::{Colors, Document};

use crate::engine::Truth;
use crate::error::EvalError;
use crate::item::Item;

/// Evaluation instrumentation.
///
/// - `trace_node` - before a node is evaluated
/// - `trace_emit` - when a path chain produces a result item
/// - `trace_truth` - after a predicate is decided
/// - `trace_lambda` - before each lambda invocation
/// - `trace_error` - when a predicate absorbs an operand error as `Unknown`
pub trait Tracer {
    fn trace_node(&mut self, view: &NodeView<'_>, depth: u32);

    fn trace_emit<D: Document>(&mut self, item: &Item<'_, D>);

    fn trace_truth(&mut self, at: NodeRef, truth: Truth);

    fn trace_lambda(&mut self, at: NodeRef, index: usize);

    fn trace_error(&mut self, at: NodeRef, error: &EvalError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_node(&mut self, _view: &NodeView<'_>, _depth: u32) {}

    #[inline(always)]
    fn trace_emit<D: Document>(&mut self, _item: &Item<'_, D>) {}

    #[inline(always)]
    fn trace_truth(&mut self, _at: NodeRef, _truth: Truth) {}

    #[inline(always)]
    fn trace_lambda(&mut self, _at: NodeRef, _index: usize) {}

    #[inline(always)]
    fn trace_error(&mut self, _at: NodeRef, _error: &EvalError) {}
}

/// Tracer that collects execution trace lines.
pub struct PrintTracer {
    lines: Vec<String>,
    colors: Colors,
    /// Depth of the last traced node, used to indent follow-up events.
    depth: u32,
}

impl PrintTracer {
    pub fn new(colors: Colors) -> Self {
        Self {
            lines: Vec::new(),
            colors,
            depth: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Print the collected trace to stderr.
    pub fn print(&self) {
        for line in &self.lines {
            eprintln!("{line}");
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth.saturating_sub(1) as usize)
    }

    fn event(&mut self, at: Option<NodeRef>, text: &str) {
        let c = self.colors;
        let offset = at.map_or_else(|| "    ".to_string(), |at| format!("{:04}", at.offset()));
        let line = format!("{}{offset}{} {}  {text}", c.dim, c.reset, self.indent());
        self.lines.push(line);
    }
}

impl Tracer for PrintTracer {
    fn trace_node(&mut self, view: &NodeView<'_>, depth: u32) {
        self.depth = depth;
        let c = self.colors;
        let mut line = format!(
            "{}{:04}{} {}{}{}{}",
            c.dim,
            view.at.offset(),
            c.reset,
            self.indent(),
            c.blue,
            view.tag.name(),
            c.reset
        );
        match &view.node {
            Node::Key(name) | Node::String(name) => {
                write!(line, " {}{name:?}{}", c.green, c.reset).unwrap();
            }
            Node::Variable(name) => write!(line, " ${name}").unwrap(),
            Node::Numeric(n) => write!(line, " {}{n}{}", c.yellow, c.reset).unwrap(),
            Node::Current { level } => write!(line, " {}@{level}{}", c.dim, c.reset).unwrap(),
            _ => {}
        }
        self.lines.push(line);
    }

    fn trace_emit<D: Document>(&mut self, item: &Item<'_, D>) {
        let c = self.colors;
        let text = format!("=> {}{}{}", c.green, item.to_json(), c.reset);
        self.event(None, &text);
    }

    fn trace_truth(&mut self, at: NodeRef, truth: Truth) {
        let c = self.colors;
        let text = format!("is {}{truth}{}", c.yellow, c.reset);
        self.event(Some(at), &text);
    }

    fn trace_lambda(&mut self, at: NodeRef, index: usize) {
        self.event(Some(at), &format!("call #{index}"));
    }

    fn trace_error(&mut self, at: NodeRef, error: &EvalError) {
        self.event(Some(at), &format!("error ({}): {error}", error.kind()));
    }
}
