//! Three-valued predicates: logic, comparisons, `starts with`,
//! `like_regex` and `exists`.
//!
//! Comparisons are existential: a predicate holds if any pair from the left
//! and right operand sequences satisfies it. Errors while evaluating an
//! operand make the predicate `Unknown` instead of failing the query.

use std::cmp::Ordering;

use regex_automata::meta::Regex;
use regex_automata::util::syntax;

use jpq_bytecode::{BinaryOp, Node, NodeRef, NodeView, RegexFlags, UnaryOp};
use jpq_core::Document;

use super::exec::{Exec, malformed};
use super::{Outcome, Truth};
use crate::Result;
use crate::error::EvalError;
use crate::item::{Item, Shape};
use crate::trace::Tracer;

/// Compare two items with `op`; `Unknown` when they are not comparable.
pub(super) fn compare_items<D: Document>(op: BinaryOp, left: &Item<'_, D>, right: &Item<'_, D>) -> Truth {
    let ord = match (left.shape(), right.shape()) {
        (Shape::Null, Shape::Null) => Ordering::Equal,
        (Shape::Null, _) | (_, Shape::Null) => return Truth::from_bool(op == BinaryOp::NotEqual),
        _ => match order(left, right) {
            Some(ord) => ord,
            None => return Truth::Unknown,
        },
    };
    Truth::from_bool(match op {
        BinaryOp::Equal => ord == Ordering::Equal,
        BinaryOp::NotEqual => ord != Ordering::Equal,
        BinaryOp::Less => ord == Ordering::Less,
        BinaryOp::LessOrEqual => ord != Ordering::Greater,
        BinaryOp::Greater => ord == Ordering::Greater,
        BinaryOp::GreaterOrEqual => ord != Ordering::Less,
        _ => false,
    })
}

/// Ordering of two scalars of the same type.
pub(super) fn order<D: Document>(left: &Item<'_, D>, right: &Item<'_, D>) -> Option<Ordering> {
    match (left.shape(), right.shape()) {
        (Shape::Null, Shape::Null) => Some(Ordering::Equal),
        (Shape::Bool(a), Shape::Bool(b)) => Some(a.cmp(&b)),
        (Shape::Number(a), Shape::Number(b)) => Some(a.cmp_total(&b)),
        (Shape::String(a), Shape::String(b)) => Some(a.cmp(b)),
        (Shape::DateTime(a), Shape::DateTime(b)) => a.compare(&b),
        _ => None,
    }
}

/// Fold one pairwise result into the running state of an existential
/// predicate; `Some` ends the search early.
fn settle(truth: Truth, strict: bool, unknown: &mut bool, hit: &mut bool) -> Option<Truth> {
    match truth {
        Truth::True if !strict => Some(Truth::True),
        Truth::True => {
            *hit = true;
            None
        }
        Truth::Unknown if strict => Some(Truth::Unknown),
        Truth::Unknown => {
            *unknown = true;
            None
        }
        Truth::False => None,
    }
}

impl<'q, 'd, D: Document, T: Tracer> Exec<'q, 'd, '_, D, T> {
    /// Evaluate `at` in boolean context.
    pub(super) fn truth(&mut self, at: NodeRef, input: &Item<'d, D>) -> Result<Truth> {
        self.enter()?;
        let result = self.view(at).and_then(|view| {
            self.tracer.trace_node(&view, self.guard.depth());
            self.truth_of(&view, input)
        });
        self.guard.leave();
        if let Ok(truth) = result {
            self.tracer.trace_truth(at, truth);
        }
        result
    }

    pub(super) fn truth_of(&mut self, view: &NodeView<'q>, input: &Item<'d, D>) -> Result<Truth> {
        match &view.node {
            Node::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let left = self.truth(*left, input)?;
                if left == Truth::False {
                    return Ok(left);
                }
                let right = self.truth(*right, input)?;
                Ok(if right == Truth::True { left } else { right })
            }
            Node::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                let left = self.truth(*left, input)?;
                if left == Truth::True {
                    return Ok(left);
                }
                let right = self.truth(*right, input)?;
                Ok(if right == Truth::False { left } else { right })
            }
            Node::Binary { op, left, right } if op.is_comparison() => {
                let op = *op;
                self.existential(view.at, *left, Some(*right), input, true, |l, r| {
                    r.map_or(Truth::Unknown, |r| compare_items(op, l, r))
                })
            }
            Node::Binary {
                op: BinaryOp::StartsWith,
                left,
                right,
            } => self.existential(view.at, *left, Some(*right), input, false, |l, r| {
                match (l.as_str(), r.and_then(|r| r.as_str())) {
                    (Some(whole), Some(prefix)) => Truth::from_bool(whole.starts_with(prefix)),
                    _ => Truth::Unknown,
                }
            }),
            Node::LikeRegex {
                expr,
                pattern,
                flags,
            } => {
                let regex = self.regex(view.at, pattern, *flags)?;
                self.existential(view.at, *expr, None, input, false, |l, _| match l.as_str() {
                    Some(text) => Truth::from_bool(regex.is_match(text)),
                    None => Truth::Unknown,
                })
            }
            Node::Unary {
                op: UnaryOp::Not,
                arg,
            } => Ok(self.truth(*arg, input)?.not()),
            Node::Unary {
                op: UnaryOp::IsUnknown,
                arg,
            } => Ok(Truth::from_bool(self.truth(*arg, input)? == Truth::Unknown)),
            Node::Unary {
                op: UnaryOp::Exists,
                arg,
            } => self.exists(view.at, *arg, input),
            _ => self.value_truth(view, input),
        }
    }

    /// A non-predicate expression used as a filter condition must yield a
    /// single boolean; `null` reads as `Unknown`.
    fn value_truth(&mut self, view: &NodeView<'q>, input: &Item<'d, D>) -> Result<Truth> {
        let mut items = Vec::new();
        let unwrap = self.auto_unwrap();
        self.node(view, input, Some(&mut items), unwrap)?;
        if let [item] = items.as_slice() {
            match item.shape() {
                Shape::Bool(b) => return Ok(Truth::from_bool(b)),
                Shape::Null => return Ok(Truth::Unknown),
                _ => {}
            }
        }
        Err(EvalError::ComparisonUndefined(
            "filter expression must yield a single boolean".to_string(),
        ))
    }

    /// Operand sequence of a predicate; `None` when evaluating it failed
    /// with a recoverable error.
    fn operand(
        &mut self,
        at: NodeRef,
        operand: NodeRef,
        input: &Item<'d, D>,
        unwrap: bool,
    ) -> Result<Option<Vec<Item<'d, D>>>> {
        match self.collect(operand, input, unwrap) {
            Ok(items) => Ok(Some(items)),
            Err(e) if e.is_recoverable() => {
                self.tracer.trace_error(at, &e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply `test` to every (left, right) pair. Lax mode answers `True` on
    /// the first match; strict mode answers `Unknown` on the first unknown.
    fn existential<F>(
        &mut self,
        at: NodeRef,
        left: NodeRef,
        right: Option<NodeRef>,
        input: &Item<'d, D>,
        unwrap_right: bool,
        test: F,
    ) -> Result<Truth>
    where
        F: Fn(&Item<'d, D>, Option<&Item<'d, D>>) -> Truth,
    {
        let Some(lefts) = self.operand(at, left, input, true)? else {
            return Ok(Truth::Unknown);
        };
        let rights = match right {
            Some(right) => match self.operand(at, right, input, unwrap_right)? {
                Some(rights) => Some(rights),
                None => return Ok(Truth::Unknown),
            },
            None => None,
        };
        let strict = !self.mode.is_lax();
        let (mut unknown, mut hit) = (false, false);
        for l in &lefts {
            match &rights {
                Some(rights) => {
                    for r in rights {
                        if let Some(truth) = settle(test(l, Some(r)), strict, &mut unknown, &mut hit) {
                            return Ok(truth);
                        }
                    }
                }
                None => {
                    if let Some(truth) = settle(test(l, None), strict, &mut unknown, &mut hit) {
                        return Ok(truth);
                    }
                }
            }
        }
        Ok(if hit {
            Truth::True
        } else if unknown {
            Truth::Unknown
        } else {
            Truth::False
        })
    }

    fn exists(&mut self, at: NodeRef, arg: NodeRef, input: &Item<'d, D>) -> Result<Truth> {
        let result = if self.mode.is_lax() {
            self.item(arg, input, None).map(|o| o == Outcome::Found)
        } else {
            self.collect(arg, input, false).map(|items| !items.is_empty())
        };
        match result {
            Ok(exists) => Ok(Truth::from_bool(exists)),
            Err(e) if e.is_recoverable() => {
                self.tracer.trace_error(at, &e);
                Ok(if self.lenient { Truth::False } else { Truth::Unknown })
            }
            Err(e) => Err(e),
        }
    }

    /// Compiled `like_regex` pattern, cached per node.
    fn regex(&mut self, at: NodeRef, pattern: &str, flags: RegexFlags) -> Result<Regex> {
        if let Some(regex) = self.regexes.get(&at) {
            return Ok(regex.clone());
        }
        let escaped;
        let source = if flags.contains(RegexFlags::QUOTE) {
            escaped = regex_syntax::escape(pattern);
            escaped.as_str()
        } else {
            pattern
        };
        let config = syntax::Config::new()
            .case_insensitive(flags.contains(RegexFlags::CASE_INSENSITIVE))
            .dot_matches_new_line(flags.contains(RegexFlags::DOT_ALL))
            .multi_line(flags.contains(RegexFlags::MULTI_LINE))
            .ignore_whitespace(flags.contains(RegexFlags::EXTENDED));
        let regex = Regex::builder()
            .syntax(config)
            .build(source)
            .map_err(|_| malformed(at, "invalid like_regex pattern"))?;
        self.regexes.insert(at, regex.clone());
        Ok(regex)
    }
}
