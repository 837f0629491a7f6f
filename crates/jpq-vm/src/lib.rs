#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Evaluator for compiled jpq queries.
//!
//! Runs a [`CompiledQuery`](jpq_bytecode::CompiledQuery) against any
//! [`Document`](jpq_core::Document) with SQL/JSON path semantics: lax and
//! strict modes, three-valued predicates and higher-order functions.

#![allow(clippy::comparison_chain)]

pub mod engine;
mod error;
mod item;
mod limits;
mod resolver;
mod trace;

#[cfg(test)]
mod item_tests;
#[cfg(test)]
mod trace_tests;

pub use engine::{Evaluator, Truth};
pub use error::{ErrorKind, EvalError};
pub use item::Item;
pub use limits::Limits;
pub use resolver::{ExternalFn, MapResolver, NullResolver, Resolver};
pub use trace::{NoopTracer, PrintTracer, Tracer};

/// Result type for evaluation.
pub type Result<T> = std::result::Result<T, EvalError>;
