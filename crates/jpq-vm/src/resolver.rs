//! Resolution of named operators and casts.
//!
//! Compiled queries only carry the name of an `Operator` or `Cast` node. The
//! host supplies the implementation through a [`Resolver`]; each node is
//! resolved once per evaluation and cached under its cache id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jpq_core::Scalar;

/// An external function over scalars. `Err` carries a message for the caller.
pub type ExternalFn = Arc<dyn Fn(&[Scalar]) -> Result<Scalar, String> + Send + Sync>;

pub trait Resolver {
    /// Operator `name` taking `arity` arguments.
    fn operator(&self, name: &str, arity: usize) -> Option<ExternalFn>;

    /// Conversion to the (possibly dotted) type `type_name`.
    fn cast(&self, type_name: &str) -> Option<ExternalFn>;
}

/// Resolves nothing; queries with operators or casts fail with `Unresolved`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn operator(&self, _name: &str, _arity: usize) -> Option<ExternalFn> {
        None
    }

    fn cast(&self, _type_name: &str) -> Option<ExternalFn> {
        None
    }
}

/// Table-driven resolver.
#[derive(Clone, Default)]
pub struct MapResolver {
    operators: HashMap<(String, usize), ExternalFn>,
    casts: HashMap<String, ExternalFn>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operator<F>(mut self, name: &str, arity: usize, f: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<Scalar, String> + Send + Sync + 'static,
    {
        self.operators.insert((name.to_string(), arity), Arc::new(f));
        self
    }

    pub fn with_cast<F>(mut self, type_name: &str, f: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<Scalar, String> + Send + Sync + 'static,
    {
        self.casts.insert(type_name.to_string(), Arc::new(f));
        self
    }
}

impl Resolver for MapResolver {
    fn operator(&self, name: &str, arity: usize) -> Option<ExternalFn> {
        self.operators.get(&(name.to_string(), arity)).cloned()
    }

    fn cast(&self, type_name: &str) -> Option<ExternalFn> {
        self.casts.get(type_name).cloned()
    }
}

impl fmt::Debug for MapResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operators: Vec<String> = self
            .operators
            .keys()
            .map(|(name, arity)| format!("{name}/{arity}"))
            .collect();
        operators.sort();
        let mut casts: Vec<&String> = self.casts.keys().collect();
        casts.sort();
        f.debug_struct("MapResolver")
            .field("operators", &operators)
            .field("casts", &casts)
            .finish()
    }
}
