//! Evaluating an extracted formula against the entries a document holds.
//!
//! Formulas are walked with an explicit stack, so evaluation depth does not
//! depend on how deeply the formula nests.

use serde::{Deserialize, Serialize};

use crate::entry::BoolTree;

/// Index-side truth value. `Maybe` means the entry could not be checked
/// and the document has to be rechecked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ternary {
    False,
    True,
    Maybe,
}

impl Ternary {
    fn and(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::False, _) | (_, Ternary::False) => Ternary::False,
            (Ternary::True, Ternary::True) => Ternary::True,
            _ => Ternary::Maybe,
        }
    }

    fn or(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::True, _) | (_, Ternary::True) => Ternary::True,
            (Ternary::False, Ternary::False) => Ternary::False,
            _ => Ternary::Maybe,
        }
    }
}

impl From<bool> for Ternary {
    fn from(value: bool) -> Self {
        if value { Ternary::True } else { Ternary::False }
    }
}

/// Whether a document whose entry presence is `check` (indexed like the
/// query's entries) can match. `true` always requires a recheck.
pub fn consistent(formula: &BoolTree, check: &[bool]) -> bool {
    let result = evaluate(formula, |index| match check.get(index) {
        Some(present) => Ternary::from(*present),
        None => Ternary::Maybe,
    });
    result != Ternary::False
}

/// Like [`consistent`] with per-entry `Maybe`. The answer is never `True`:
/// at best the document may match.
pub fn tri_consistent(formula: &BoolTree, check: &[Ternary]) -> Ternary {
    let result = evaluate(formula, |index| {
        check.get(index).copied().unwrap_or(Ternary::Maybe)
    });
    match result {
        Ternary::False => Ternary::False,
        Ternary::True | Ternary::Maybe => Ternary::Maybe,
    }
}

enum Step<'t> {
    Visit(&'t BoolTree),
    Combine { is_and: bool, count: usize },
}

fn evaluate(formula: &BoolTree, leaf: impl Fn(usize) -> Ternary) -> Ternary {
    let mut work = vec![Step::Visit(formula)];
    let mut values: Vec<Ternary> = Vec::new();
    while let Some(step) = work.pop() {
        match step {
            Step::Visit(BoolTree::Entry(index)) => values.push(leaf(*index)),
            Step::Visit(BoolTree::And(args)) => {
                work.push(Step::Combine {
                    is_and: true,
                    count: args.len(),
                });
                work.extend(args.iter().rev().map(Step::Visit));
            }
            Step::Visit(BoolTree::Or(args)) => {
                work.push(Step::Combine {
                    is_and: false,
                    count: args.len(),
                });
                work.extend(args.iter().rev().map(Step::Visit));
            }
            Step::Combine { is_and, count } => {
                let args = values.split_off(values.len().saturating_sub(count));
                let combined = if is_and {
                    args.into_iter().fold(Ternary::True, Ternary::and)
                } else {
                    args.into_iter().fold(Ternary::False, Ternary::or)
                };
                values.push(combined);
            }
        }
    }
    values.pop().unwrap_or(Ternary::Maybe)
}
