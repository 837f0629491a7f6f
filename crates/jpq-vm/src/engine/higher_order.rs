//! `map`, `flatmap`, the folds, `min` and `max`.
//!
//! The input is either the method receiver or the first argument of the
//! function form. An array input produces an array item; a sequence wrapped
//! in lax mode produces a sequence.

use std::cmp::Ordering;

use jpq_bytecode::{HigherOrderKind, Node, NodeRef, NodeView};
use jpq_core::{Document, Numeric};

use super::Outcome;
use super::exec::{Exec, Found, Frame, malformed, single};
use super::predicate::order;
use crate::Result;
use crate::error::EvalError;
use crate::item::Item;
use crate::trace::Tracer;

/// Elements a higher-order function iterates over.
struct Input<'d, D> {
    elements: Vec<Item<'d, D>>,
    /// Passed as the third lambda argument of `map`.
    whole: Item<'d, D>,
    is_array: bool,
}

fn count_mismatch(
    kind: HigherOrderKind,
    what: &'static str,
    expected: &'static str,
    actual: usize,
) -> EvalError {
    EvalError::ArgumentCountMismatch {
        function: kind.as_str(),
        what,
        expected,
        actual,
    }
}

fn index_item<'d, D>(index: usize) -> Item<'d, D> {
    Item::Number(Numeric::Int(index as i64))
}

impl<'q, 'd, D: Document, T: Tracer> Exec<'q, 'd, '_, D, T> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn higher_order(
        &mut self,
        view: &NodeView<'q>,
        kind: HigherOrderKind,
        array: Option<NodeRef>,
        lambda: Option<NodeRef>,
        seed: Option<NodeRef>,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let arity = self.check_signature(kind, lambda, seed.is_some())?;
        let elements = self.hof_input(kind, array, input)?;
        match (lambda, kind) {
            (_, HigherOrderKind::Min | HigherOrderKind::Max) => self.extremum(view, kind, elements, found),
            (Some(lambda), HigherOrderKind::Map | HigherOrderKind::FlatMap) => {
                self.map(view, kind, lambda, arity, elements, found)
            }
            (Some(lambda), _) => {
                let seed = match seed {
                    Some(seed) => {
                        let values = self.collect(seed, input, false)?;
                        Some(single(values).ok_or_else(|| {
                            EvalError::SingletonRequired(format!(
                                "seed of {}() must be a single item",
                                kind.as_str()
                            ))
                        })?)
                    }
                    None => None,
                };
                self.fold(view, kind, lambda, arity, seed, elements, found)
            }
            (None, _) => Err(malformed(view.at, "higher-order call without a lambda")),
        }
    }

    /// Check the lambda and seed against what `kind` accepts; returns the
    /// lambda's parameter count.
    fn check_signature(
        &self,
        kind: HigherOrderKind,
        lambda: Option<NodeRef>,
        has_seed: bool,
    ) -> Result<usize> {
        let arity = match lambda {
            Some(lambda) => Some(self.lambda_arity(lambda)?),
            None => None,
        };
        let seed_count = usize::from(has_seed);
        match kind {
            HigherOrderKind::Min | HigherOrderKind::Max => {
                if lambda.is_some() {
                    return Err(count_mismatch(kind, "lambda arguments", "0", 1));
                }
                if has_seed {
                    return Err(count_mismatch(kind, "seed arguments", "0", 1));
                }
                Ok(0)
            }
            HigherOrderKind::Map | HigherOrderKind::FlatMap => {
                let arity = arity.ok_or_else(|| count_mismatch(kind, "lambda arguments", "1", 0))?;
                if arity > 3 {
                    return Err(count_mismatch(kind, "lambda parameters", "0 to 3", arity));
                }
                if has_seed {
                    return Err(count_mismatch(kind, "seed arguments", "0", seed_count));
                }
                Ok(arity)
            }
            _ => {
                let arity = arity.ok_or_else(|| count_mismatch(kind, "lambda arguments", "1", 0))?;
                if !(2..=3).contains(&arity) {
                    return Err(count_mismatch(kind, "lambda parameters", "2 or 3", arity));
                }
                match kind {
                    HigherOrderKind::Reduce if has_seed => {
                        Err(count_mismatch(kind, "seed arguments", "0", seed_count))
                    }
                    HigherOrderKind::FoldLeft | HigherOrderKind::FoldRight if !has_seed => {
                        Err(count_mismatch(kind, "seed arguments", "1", seed_count))
                    }
                    _ => Ok(arity),
                }
            }
        }
    }

    fn lambda_arity(&self, lambda: NodeRef) -> Result<usize> {
        match self.view(lambda)?.node {
            Node::Lambda { params, .. } => Ok(params.len()),
            _ => Err(malformed(lambda, "expected a lambda")),
        }
    }

    fn hof_input(
        &mut self,
        kind: HigherOrderKind,
        array: Option<NodeRef>,
        input: &Item<'d, D>,
    ) -> Result<Input<'d, D>> {
        let wrapped = match array {
            Some(array) => {
                let mut values = self.collect(array, input, false)?;
                if values.len() == 1 && values[0].is_array() {
                    let whole = values.remove(0);
                    return Ok(Input {
                        elements: whole.elements(),
                        whole,
                        is_array: true,
                    });
                }
                if !self.auto_wrap() {
                    return Err(EvalError::TypeMismatch(format!(
                        "first argument of {}() must be an array",
                        kind.as_str()
                    )));
                }
                values
            }
            None => {
                if input.is_array() {
                    return Ok(Input {
                        elements: input.elements(),
                        whole: input.clone(),
                        is_array: true,
                    });
                }
                if !self.auto_wrap() {
                    return Err(EvalError::TypeMismatch(format!(
                        "jsonpath item method .{}() can only be applied to an array",
                        kind.as_str()
                    )));
                }
                vec![input.clone()]
            }
        };
        Ok(Input {
            whole: Item::Array(wrapped.clone()),
            elements: wrapped,
            is_array: false,
        })
    }

    /// Invoke `lambda` with `args` bound to its parameters and `current` as `@`.
    fn call(
        &mut self,
        kind: HigherOrderKind,
        lambda: NodeRef,
        args: Vec<Item<'d, D>>,
        current: Item<'d, D>,
    ) -> Result<Item<'d, D>> {
        let Node::Lambda { params, body } = self.view(lambda)?.node else {
            return Err(malformed(lambda, "expected a lambda"));
        };
        self.enter()?;
        self.frames.push(Frame {
            params: params.collect(),
            args,
        });
        self.items.push(current.clone());
        let mut results = Vec::new();
        let outcome = self.item(body, &current, Some(&mut results));
        self.items.pop();
        self.frames.pop();
        self.guard.leave();
        outcome?;
        let count = results.len();
        single(results).ok_or_else(|| {
            EvalError::SingletonRequired(format!(
                "lambda of {}() must return a single item, got {count}",
                kind.as_str()
            ))
        })
    }

    fn map(
        &mut self,
        view: &NodeView<'q>,
        kind: HigherOrderKind,
        lambda: NodeRef,
        arity: usize,
        input: Input<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let mut results = Vec::with_capacity(input.elements.len());
        for (index, elem) in input.elements.iter().enumerate() {
            self.tracer.trace_lambda(view.at, index);
            let mut args = Vec::with_capacity(arity);
            if arity > 0 {
                args.push(elem.clone());
            }
            if arity > 1 {
                args.push(index_item(index));
            }
            if arity > 2 {
                args.push(input.whole.clone());
            }
            let result = self.call(kind, lambda, args, elem.clone())?;
            if kind == HigherOrderKind::Map {
                results.push(result);
            } else if result.is_array() {
                results.extend(result.elements());
            } else if self.auto_wrap() {
                results.push(result);
            } else {
                return Err(EvalError::TypeMismatch(
                    "lambda of flatmap() must return an array".to_string(),
                ));
            }
        }
        if input.is_array {
            self.next(view.next, Item::Array(results), found)
        } else {
            self.each(view.next, results, found)
        }
    }

    /// Left folds pass `(acc, elem, index)`; `foldr` walks backwards passing
    /// `(elem, acc, index)`. Without a seed the first element starts the fold.
    #[allow(clippy::too_many_arguments)]
    fn fold(
        &mut self,
        view: &NodeView<'q>,
        kind: HigherOrderKind,
        lambda: NodeRef,
        arity: usize,
        seed: Option<Item<'d, D>>,
        input: Input<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let elements = input.elements;
        let (mut acc, start) = match seed {
            Some(seed) => (seed, 0),
            None => match elements.first() {
                Some(first) => (first.clone(), 1),
                None => return Ok(Outcome::NotFound),
            },
        };
        let indices: Vec<usize> = if kind == HigherOrderKind::FoldRight {
            (start..elements.len()).rev().collect()
        } else {
            (start..elements.len()).collect()
        };
        for index in indices {
            self.tracer.trace_lambda(view.at, index);
            let elem = elements[index].clone();
            let mut args = if kind == HigherOrderKind::FoldRight {
                vec![elem.clone(), acc]
            } else {
                vec![acc, elem.clone()]
            };
            if arity > 2 {
                args.push(index_item(index));
            }
            acc = self.call(kind, lambda, args, elem)?;
        }
        self.next(view.next, acc, found)
    }

    fn extremum(
        &mut self,
        view: &NodeView<'q>,
        kind: HigherOrderKind,
        input: Input<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let wanted = if kind == HigherOrderKind::Min {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        let mut best: Option<Item<'d, D>> = None;
        for item in input.elements {
            best = Some(match best {
                None => item,
                Some(current) => {
                    let ord = order(&item, &current).ok_or_else(|| {
                        EvalError::TypeMismatch(format!(
                            "{}() cannot compare {} with {}",
                            kind.as_str(),
                            item.type_name(),
                            current.type_name()
                        ))
                    })?;
                    if ord == wanted { item } else { current }
                }
            });
        }
        match best {
            Some(best) => self.next(view.next, best, found),
            None => Ok(Outcome::NotFound),
        }
    }
}
