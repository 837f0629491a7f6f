//! Query side: the entries a matching document must hold.
//!
//! Under [`Strategy::Match`] a predicate query goes through the boolean
//! extractor, which handles `&&`, `||`, `!`, `exists` and `path == literal`.
//! Any other query is a path whose existence is tested; a path query can only
//! match when it yields an item, so both strategies extract it the same way.
//! Under [`Strategy::Exists`] a predicate query always yields its truth value
//! as an item, so no document can be ruled out. Paths are followed step by step while
//! the scheme can express them; filters met on the way contribute their own
//! formulas, which are AND-ed with the path's entries.
//!
//! Every formula is a necessary condition: a document missing it cannot
//! match, a document satisfying it still has to be rechecked.

use std::collections::HashSet;

use indexmap::IndexSet;
use jpq_bytecode::{BinaryOp, CompiledQuery, Node, NodeRef, UnaryOp};
use jpq_core::{DepthGuard, Scalar, hash_key, hash_scalar};
use serde::Serialize;

use crate::Result;
use crate::consistency::consistent;
use crate::entry::{BoolTree, Entry, Scheme, Strategy};
use crate::error::ExtractError;

/// Entries needed by a query and the formula that combines them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexQuery {
    pub entries: IndexSet<Entry>,
    pub formula: BoolTree,
}

impl IndexQuery {
    /// Which of the query's entries appear in `doc_entries`, by entry index.
    pub fn presence(&self, doc_entries: &[Entry]) -> Vec<bool> {
        let held: HashSet<&Entry> = doc_entries.iter().collect();
        self.entries.iter().map(|entry| held.contains(entry)).collect()
    }

    /// Whether a document with `doc_entries` can match.
    pub fn consistent_with(&self, doc_entries: &[Entry]) -> bool {
        consistent(&self.formula, &self.presence(doc_entries))
    }
}

/// Extract for [`Strategy::Match`] with the default recursion limit.
pub fn extract_query(query: &CompiledQuery, scheme: Scheme) -> Result<IndexQuery> {
    QueryExtractor::new(scheme).extract(query)
}

#[derive(Clone, Copy, Debug)]
pub struct QueryExtractor {
    scheme: Scheme,
    strategy: Strategy,
    recursion_limit: u32,
}

impl QueryExtractor {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            strategy: Strategy::default(),
            recursion_limit: DepthGuard::DEFAULT_LIMIT,
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// [`ExtractError::Unsupported`] means the index cannot narrow the
    /// search and every document has to be scanned.
    pub fn extract(&self, query: &CompiledQuery) -> Result<IndexQuery> {
        let root = query.root_view()?;
        let mut cx = Extraction {
            query,
            scheme: self.scheme,
            lax: query.is_lax(),
            scratch: Vec::new(),
            scopes: vec![Path::default()],
            guard: DepthGuard::new(self.recursion_limit),
        };
        let formula = match (self.strategy, root.tag.is_predicate()) {
            (Strategy::Match, true) => cx.boolean(root.at, false)?,
            (Strategy::Exists, true) => {
                return Err(ExtractError::Unsupported("predicate always yields an item"));
            }
            (_, false) => cx.path(root.at, None)?,
        };
        let formula = formula.ok_or(ExtractError::Unsupported("no indexable condition"))?;

        let mut entries = IndexSet::new();
        let formula = intern(formula, &cx.scratch, &mut entries);
        Ok(IndexQuery { entries, formula })
    }
}

/// Replace scratch indices by indices into the deduplicated entry set.
fn intern(tree: BoolTree, scratch: &[Entry], entries: &mut IndexSet<Entry>) -> BoolTree {
    match tree {
        BoolTree::Entry(index) => BoolTree::Entry(entries.insert_full(scratch[index].clone()).0),
        BoolTree::And(args) => BoolTree::and(
            args.into_iter()
                .map(|arg| intern(arg, scratch, entries))
                .collect(),
        ),
        BoolTree::Or(args) => BoolTree::or(
            args.into_iter()
                .map(|arg| intern(arg, scratch, entries))
                .collect(),
        ),
    }
}

/// Kind of the last accessor seen on a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Key,
    AnyKey,
    Array,
    Any,
}

/// Accessors followed so far. Full-key paths keep the key names, hash-chain
/// paths the running hash.
#[derive(Clone, Debug, Default)]
struct Path<'q> {
    keys: Vec<&'q str>,
    last: Option<Step>,
    hash: u32,
}

impl<'q> Path<'q> {
    /// Follow `node`; `false` when the scheme cannot express it.
    fn push(&mut self, node: &Node<'q>, scheme: Scheme) -> bool {
        let step = match node {
            Node::Root => {
                *self = Path::default();
                return true;
            }
            Node::Key(key) => {
                self.keys.push(*key);
                hash_key(key, &mut self.hash);
                Step::Key
            }
            Node::AnyArray | Node::IndexArray(_) => Step::Array,
            Node::AnyKey if scheme == Scheme::FullKey => Step::AnyKey,
            Node::Any { .. } if scheme == Scheme::FullKey => Step::Any,
            _ => return false,
        };
        self.last = Some(step);
        true
    }
}

struct Extraction<'q> {
    query: &'q CompiledQuery,
    scheme: Scheme,
    lax: bool,
    /// Entries in creation order; [`BoolTree::Entry`] indexes this until
    /// the final [`intern`].
    scratch: Vec<Entry>,
    /// Path of the item at each nesting level; level 0 is the root.
    scopes: Vec<Path<'q>>,
    guard: DepthGuard,
}

impl<'q> Extraction<'q> {
    fn entry(&mut self, entry: Entry) -> BoolTree {
        self.scratch.push(entry);
        BoolTree::Entry(self.scratch.len() - 1)
    }

    fn boolean(&mut self, at: NodeRef, negated: bool) -> Result<Option<BoolTree>> {
        self.guard.enter()?;
        let result = self.boolean_inner(at, negated);
        self.guard.leave();
        result
    }

    /// `negated` tracks an odd number of enclosing `!`, pushed down with
    /// De Morgan. Negated leaves are never indexable.
    fn boolean_inner(&mut self, at: NodeRef, negated: bool) -> Result<Option<BoolTree>> {
        let view = self.query.view(at)?;
        match view.node {
            Node::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
            } => {
                let left = self.boolean(left, negated)?;
                let right = self.boolean(right, negated)?;
                let conjunction = (op == BinaryOp::And) != negated;
                Ok(match (left, right) {
                    (Some(left), Some(right)) if conjunction => {
                        Some(BoolTree::and(vec![left, right]))
                    }
                    (Some(left), Some(right)) => Some(BoolTree::or(vec![left, right])),
                    // an unindexable conjunct only widens the result
                    (left, right) if conjunction => left.or(right),
                    _ => None,
                })
            }
            Node::Unary {
                op: UnaryOp::Not,
                arg,
            } => self.boolean(arg, !negated),
            Node::Unary {
                op: UnaryOp::Exists,
                arg,
            } if !negated => self.path(arg, None),
            Node::Binary {
                op: BinaryOp::Equal,
                left,
                right,
            } if !negated => {
                if let Some(scalar) = self.literal(left)? {
                    self.path(right, Some(&scalar))
                } else if let Some(scalar) = self.literal(right)? {
                    self.path(left, Some(&scalar))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn literal(&self, at: NodeRef) -> Result<Option<Scalar>> {
        let view = self.query.view(at)?;
        if view.next.is_some() {
            return Ok(None);
        }
        Ok(match view.node {
            Node::Null => Some(Scalar::Null),
            Node::Bool(b) => Some(Scalar::Bool(b)),
            Node::Numeric(n) => Some(Scalar::Number(n)),
            Node::String(s) => Some(Scalar::String(s.to_string())),
            _ => None,
        })
    }

    /// Conditions implied by the path at `start` producing an item (equal to
    /// `scalar`, when given).
    fn path(&mut self, start: NodeRef, scalar: Option<&Scalar>) -> Result<Option<BoolTree>> {
        let mut nodes = self.path_nodes(start, scalar)?;
        Ok(match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => Some(BoolTree::and(nodes)),
        })
    }

    fn path_nodes(&mut self, start: NodeRef, scalar: Option<&Scalar>) -> Result<Vec<BoolTree>> {
        let mut path = self.scopes.last().cloned().unwrap_or_default();
        let mut nodes = Vec::new();
        let mut at = Some(start);
        while let Some(current) = at {
            let view = self.query.view(current)?;
            match &view.node {
                Node::Current { level } => match self.scopes.get(*level as usize) {
                    Some(scope) => path = scope.clone(),
                    None => return Ok(nodes),
                },
                Node::Filter(arg) => {
                    self.scopes.push(path.clone());
                    let filter = self.boolean(*arg, false);
                    self.scopes.pop();
                    nodes.extend(filter?);
                }
                node => {
                    if !path.push(node, self.scheme) {
                        // the filters collected so far still hold
                        return Ok(nodes);
                    }
                }
            }
            at = view.next;
        }
        match self.scheme {
            Scheme::FullKey => self.full_key_leaf(&path, scalar, &mut nodes),
            Scheme::HashChain => self.hash_chain_leaf(&path, scalar, &mut nodes),
        }
        Ok(nodes)
    }

    fn full_key_leaf(&mut self, path: &Path<'q>, scalar: Option<&Scalar>, nodes: &mut Vec<BoolTree>) {
        for key in &path.keys {
            let node = self.entry(Entry::key(key));
            nodes.push(node);
        }
        let Some(scalar) = scalar else {
            return;
        };
        let Scalar::String(text) = scalar else {
            let node = self.entry(Entry::value(scalar));
            nodes.push(node);
            return;
        };
        // String array elements are stored as keys. Whether the compared
        // item is such an element depends on the mode and the last step.
        let (as_key, as_value) = match path.last {
            _ if self.lax => (true, true),
            Some(Step::Array) => (true, false),
            Some(Step::Any) => (true, true),
            None | Some(Step::Key | Step::AnyKey) => (false, true),
        };
        let mut options = Vec::with_capacity(2);
        if as_key {
            options.push(self.entry(Entry::key(text)));
        }
        if as_value {
            options.push(self.entry(Entry::value(scalar)));
        }
        nodes.push(BoolTree::or(options));
    }

    /// Hash-chain entries only describe scalars, so a bare existence test
    /// adds nothing.
    fn hash_chain_leaf(&mut self, path: &Path<'q>, scalar: Option<&Scalar>, nodes: &mut Vec<BoolTree>) {
        if let Some(scalar) = scalar {
            let mut hash = path.hash;
            hash_scalar(scalar, &mut hash);
            let node = self.entry(Entry::PathHash(hash));
            nodes.push(node);
        }
    }
}
