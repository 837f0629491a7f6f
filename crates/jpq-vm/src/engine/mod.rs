//! Evaluation engine for compiled queries.
//!
//! [`Evaluator`] is the configured entry point; the recursive interpreter
//! lives in `exec` with predicates, item methods and higher-order functions
//! split into their own modules.

mod exec;
mod higher_order;
mod methods;
mod predicate;

#[cfg(test)]
mod methods_tests;

use std::fmt;

use serde_json::Value;

use jpq_bytecode::CompiledQuery;
use jpq_core::{Document, Variables};

use crate::error::EvalError;
use crate::item::{Item, Shape};
use crate::limits::Limits;
use crate::resolver::{NullResolver, Resolver};
use crate::trace::{NoopTracer, Tracer};
use crate::Result;

use exec::Exec;

/// Three-valued truth of a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn from_bool(value: bool) -> Self {
        if value { Truth::True } else { Truth::False }
    }

    pub fn not(self) -> Self {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Truth::True => "true",
            Truth::False => "false",
            Truth::Unknown => "unknown",
        })
    }
}

/// Whether a path evaluation produced anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Found,
    NotFound,
}

static NULL_RESOLVER: NullResolver = NullResolver;

/// A compiled query configured for evaluation.
///
/// ```ignore
/// let items = Evaluator::new(&query).lenient(true).query(&doc)?;
/// ```
pub struct Evaluator<'a, D = Value> {
    query: &'a CompiledQuery,
    limits: Limits,
    lenient: bool,
    vars: Option<&'a dyn Variables<D>>,
    resolver: &'a dyn Resolver,
}

impl<'a, D: Document> Evaluator<'a, D> {
    pub fn new(query: &'a CompiledQuery) -> Self {
        Self {
            query,
            limits: Limits::default(),
            lenient: false,
            vars: None,
            resolver: &NULL_RESOLVER,
        }
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Swallow data-shape errors into "no result" instead of raising them.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Values for `$name` references left unbound at compile time.
    pub fn vars(mut self, vars: &'a dyn Variables<D>) -> Self {
        self.vars = Some(vars);
        self
    }

    pub fn resolver(mut self, resolver: &'a dyn Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Does the query produce any item? `None` when a lenient evaluation failed.
    pub fn exists<'d>(&self, doc: &'d D) -> Result<Option<bool>>
    where
        'a: 'd,
    {
        match self.exec(&mut NoopTracer).run(doc, None) {
            Ok(outcome) => Ok(Some(outcome == Outcome::Found)),
            Err(e) if self.lenient && e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Result of a predicate query. `None` stands for `Unknown`.
    pub fn matches<'d>(&self, doc: &'d D) -> Result<Option<bool>>
    where
        'a: 'd,
    {
        let items = match self.collect(doc, &mut NoopTracer) {
            Ok(items) => items,
            Err(e) if self.lenient && e.is_recoverable() => return Ok(None),
            Err(e) => return Err(e),
        };
        if let [item] = items.as_slice() {
            match item.shape() {
                Shape::Bool(b) => return Ok(Some(b)),
                Shape::Null => return Ok(None),
                _ => {}
            }
        }
        if self.lenient {
            return Ok(None);
        }
        Err(EvalError::ComparisonUndefined(
            "single boolean result is expected".to_string(),
        ))
    }

    /// All items, in document order.
    pub fn query<'d>(&self, doc: &'d D) -> Result<Vec<Item<'d, D>>>
    where
        'a: 'd,
    {
        self.query_with(doc, &mut NoopTracer)
    }

    pub fn query_first<'d>(&self, doc: &'d D) -> Result<Option<Item<'d, D>>>
    where
        'a: 'd,
    {
        Ok(self.query(doc)?.into_iter().next())
    }

    /// All items wrapped in one array item.
    pub fn query_array<'d>(&self, doc: &'d D) -> Result<Item<'d, D>>
    where
        'a: 'd,
    {
        self.query(doc).map(Item::Array)
    }

    /// [`query`](Self::query) with a tracer observing every step.
    pub fn query_with<'d, T: Tracer>(&self, doc: &'d D, tracer: &mut T) -> Result<Vec<Item<'d, D>>>
    where
        'a: 'd,
    {
        match self.collect(doc, tracer) {
            Err(e) if self.lenient && e.is_recoverable() => Ok(Vec::new()),
            result => result,
        }
    }

    fn collect<'d, T: Tracer>(&self, doc: &'d D, tracer: &mut T) -> Result<Vec<Item<'d, D>>>
    where
        'a: 'd,
    {
        let mut found = Vec::new();
        self.exec(tracer).run(doc, Some(&mut found))?;
        Ok(found)
    }

    fn exec<'d, 't, T: Tracer>(&self, tracer: &'t mut T) -> Exec<'a, 'd, 't, D, T>
    where
        'a: 'd,
    {
        Exec::new(
            self.query,
            self.limits,
            self.lenient,
            self.vars,
            self.resolver,
            tracer,
        )
    }
}
