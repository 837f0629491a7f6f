//! Recursive interpreter: path steps, constructors and external calls.
//!
//! Every evaluation function takes an optional `found` sink. With a sink the
//! results of the chain are appended to it; without one the caller only asks
//! whether anything exists, and evaluation stops at the first result.

use std::collections::HashMap;

use regex_automata::meta::Regex;

use jpq_bytecode::{
    ANY_LAST, CompiledQuery, DecodeError, Node, NodeRef, NodeView, Pairs, Refs,
    Subscripts, UnaryOp,
};
use jpq_core::{DepthGuard, Document, Mode, Numeric, Variables};

use super::{Outcome, Truth};
use crate::Result;
use crate::error::EvalError;
use crate::item::Item;
use crate::limits::Limits;
use crate::resolver::{ExternalFn, Resolver};
use crate::trace::Tracer;

/// Output sink of a path evaluation.
pub(super) type Found<'f, 'd, D> = Option<&'f mut Vec<Item<'d, D>>>;

/// Arguments bound by one lambda invocation.
pub(super) struct Frame<'q, 'd, D> {
    pub(super) params: Vec<&'q str>,
    pub(super) args: Vec<Item<'d, D>>,
}

pub(super) fn malformed(at: NodeRef, reason: &'static str) -> EvalError {
    EvalError::Malformed(DecodeError::Malformed {
        offset: at.offset(),
        reason,
    })
}

/// Take the only item of `items`.
pub(super) fn single<T>(mut items: Vec<T>) -> Option<T> {
    if items.len() == 1 { items.pop() } else { None }
}

/// Evaluation state for one run of a query against one document.
pub(crate) struct Exec<'q, 'd, 't, D, T> {
    pub(super) query: &'q CompiledQuery,
    pub(super) mode: Mode,
    pub(super) lenient: bool,
    vars: Option<&'d dyn Variables<D>>,
    resolver: &'q dyn Resolver,
    /// Current item per nesting level; level 0 holds the document root.
    pub(super) items: Vec<Item<'d, D>>,
    /// Innermost lambda invocation last.
    pub(super) frames: Vec<Frame<'q, 'd, D>>,
    /// Resolved operators and casts, indexed by cache id.
    externals: Vec<Option<ExternalFn>>,
    pub(super) regexes: HashMap<NodeRef, Regex>,
    pub(super) guard: DepthGuard,
    fuel: u32,
    limits: Limits,
    /// Lax mode, or anywhere below `.**`.
    pub(super) ignore_structural: bool,
    /// Size of the array whose subscripts are being evaluated (for `last`).
    innermost_array_size: Option<usize>,
    pub(super) tracer: &'t mut T,
}

impl<'q, 'd, 't, D: Document, T: Tracer> Exec<'q, 'd, 't, D, T> {
    pub(super) fn new(
        query: &'q CompiledQuery,
        limits: Limits,
        lenient: bool,
        vars: Option<&'d dyn Variables<D>>,
        resolver: &'q dyn Resolver,
        tracer: &'t mut T,
    ) -> Self {
        let mode = query.mode();
        Self {
            query,
            mode,
            lenient,
            vars,
            resolver,
            items: Vec::new(),
            frames: Vec::new(),
            externals: Vec::new(),
            regexes: HashMap::new(),
            guard: DepthGuard::new(limits.recursion_limit).with_stack_budget(limits.stack_budget),
            fuel: limits.exec_fuel,
            limits,
            ignore_structural: mode.is_lax(),
            innermost_array_size: None,
            tracer,
        }
    }

    pub(super) fn run(&mut self, doc: &'d D, found: Found<'_, 'd, D>) -> Result<Outcome> {
        let root = Item::Node(doc);
        self.items.clear();
        self.items.push(root.clone());
        self.item(self.query.root(), &root, found)
    }

    pub(super) fn auto_unwrap(&self) -> bool {
        self.mode.is_lax()
    }

    pub(super) fn auto_wrap(&self) -> bool {
        self.mode.is_lax()
    }

    pub(super) fn view(&self, at: NodeRef) -> Result<NodeView<'q>> {
        Ok(self.query.view(at)?)
    }

    pub(super) fn tick(&mut self) -> Result<()> {
        if self.fuel == 0 {
            return Err(EvalError::ExecFuelExhausted(self.limits.exec_fuel));
        }
        self.fuel -= 1;
        Ok(())
    }

    /// Spend one unit of fuel and enter one level of recursion.
    /// Pair with `self.guard.leave()`.
    pub(super) fn enter(&mut self) -> Result<()> {
        self.tick()?;
        self.guard
            .enter()
            .map_err(|e| EvalError::DepthLimitExceeded(e.limit))
    }

    /// Evaluate `at` against `input`, unwrapping array inputs in lax mode.
    pub(super) fn item(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let unwrap = self.auto_unwrap();
        self.item_opt_unwrap(at, input, found, unwrap)
    }

    pub(super) fn item_opt_unwrap(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        self.enter()?;
        let result = self.view_and_eval(at, input, found, unwrap);
        self.guard.leave();
        result
    }

    fn view_and_eval(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        let view = self.view(at)?;
        self.tracer.trace_node(&view, self.guard.depth());
        self.node(&view, input, found, unwrap)
    }

    /// Evaluate all results of `at` into a list; with `unwrap_result` (lax
    /// only) array results are flattened one level.
    pub(super) fn collect(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        unwrap_result: bool,
    ) -> Result<Vec<Item<'d, D>>> {
        let mut seq = Vec::new();
        self.item(at, input, Some(&mut seq))?;
        if !(unwrap_result && self.auto_unwrap()) {
            return Ok(seq);
        }
        let mut out = Vec::with_capacity(seq.len());
        for item in seq {
            if item.is_array() {
                out.extend(item.elements());
            } else {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Continue with the next step of the chain, or emit `item` at its end.
    pub(super) fn next(
        &mut self,
        next: Option<NodeRef>,
        item: Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        match next {
            Some(next) => self.item(next, &item, found),
            None => {
                if let Some(found) = found {
                    self.tracer.trace_emit(&item);
                    found.push(item);
                }
                Ok(Outcome::Found)
            }
        }
    }

    /// [`next`](Self::next) for every item of `items`.
    pub(super) fn each(
        &mut self,
        next: Option<NodeRef>,
        items: Vec<Item<'d, D>>,
        mut found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let mut outcome = Outcome::NotFound;
        for item in items {
            if self.next(next, item, found.as_deref_mut())? == Outcome::Found {
                outcome = Outcome::Found;
                if found.is_none() {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Apply the node at `at` to every element of the array `input`.
    pub(super) fn unwrap_target(
        &mut self,
        at: NodeRef,
        input: &Item<'d, D>,
        mut found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let mut outcome = Outcome::NotFound;
        for elem in input.elements() {
            if self.item_opt_unwrap(at, &elem, found.as_deref_mut(), false)? == Outcome::Found {
                outcome = Outcome::Found;
                if found.is_none() {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    pub(super) fn node(
        &mut self,
        view: &NodeView<'q>,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        match &view.node {
            Node::Null => self.next(view.next, Item::Null, found),
            Node::Bool(b) => self.next(view.next, Item::Bool(*b), found),
            Node::Numeric(n) => self.next(view.next, Item::Number(*n), found),
            Node::String(s) => self.next(view.next, Item::String(s.to_string()), found),
            Node::Key(name) => self.key(view, name, input, found, unwrap),
            Node::Current { level } => {
                let item = self
                    .items
                    .get(*level as usize)
                    .cloned()
                    .ok_or_else(|| malformed(view.at, "current item level out of range"))?;
                self.next(view.next, item, found)
            }
            Node::Root => {
                let root = self
                    .items
                    .first()
                    .cloned()
                    .ok_or_else(|| malformed(view.at, "no root item"))?;
                self.next(view.next, root, found)
            }
            Node::Variable(name) => {
                let item = self.variable(name)?;
                self.next(view.next, item, found)
            }
            Node::Last => {
                let size = self
                    .innermost_array_size
                    .ok_or_else(|| malformed(view.at, "`last` outside of an array subscript"))?;
                let last = Numeric::Int(size as i64 - 1);
                self.next(view.next, Item::Number(last), found)
            }
            Node::AnyKey => self.any_key(view, input, found, unwrap),
            Node::AnyArray => self.any_array(view, input, found),
            Node::IndexArray(subscripts) => self.index_array(view, subscripts.clone(), input, found),
            Node::Any { first, last } => self.any(view, (*first, *last), input, found),
            Node::Binary { op, left, right } if op.is_arithmetic() => {
                self.arithmetic(view, *op, *left, *right, input, found)
            }
            Node::Unary {
                op: op @ (UnaryOp::Plus | UnaryOp::Minus),
                arg,
            } => self.unary_arithmetic(view, *op, *arg, input, found),
            Node::Binary { .. } | Node::Unary { .. } | Node::LikeRegex { .. } => {
                let truth = self.truth_of(view, input)?;
                self.tracer.trace_truth(view.at, truth);
                let item = match truth {
                    Truth::True => Item::Bool(true),
                    Truth::False => Item::Bool(false),
                    Truth::Unknown => Item::Null,
                };
                self.next(view.next, item, found)
            }
            Node::Filter(arg) => {
                if unwrap && input.is_array() {
                    return self.unwrap_target(view.at, input, found);
                }
                if self.nested_truth(*arg, input)? == Truth::True {
                    self.next(view.next, input.clone(), found)
                } else {
                    Ok(Outcome::NotFound)
                }
            }
            Node::Method(method) => self.method(view, *method, input, found, unwrap),
            Node::Sequence(items) => {
                let items = self.operands(items.clone(), input)?;
                self.each(view.next, items, found)
            }
            Node::Array(items) => {
                let items = self.operands(items.clone(), input)?;
                self.next(view.next, Item::Array(items), found)
            }
            Node::Object(pairs) => {
                let object = self.object(pairs.clone(), input)?;
                self.next(view.next, object, found)
            }
            Node::Operator {
                name,
                cache_id,
                args,
            } => {
                let result = self.operator(view.at, name, *cache_id, args.clone(), input)?;
                self.next(view.next, result, found)
            }
            Node::Cast {
                arg,
                type_name,
                cache_id,
            } => {
                let result = self.cast(view.at, *arg, type_name, *cache_id, input)?;
                self.next(view.next, result, found)
            }
            Node::Lambda { .. } => Err(malformed(view.at, "lambda outside of a higher-order call")),
            Node::HigherOrder {
                kind,
                array,
                lambda,
                seed,
            } => self.higher_order(view, *kind, *array, *lambda, *seed, input, found),
        }
    }

    fn variable(&self, name: &str) -> Result<Item<'d, D>> {
        for frame in self.frames.iter().rev() {
            if let Some(i) = frame.params.iter().position(|p| *p == name)
                && let Some(arg) = frame.args.get(i)
            {
                return Ok(arg.clone());
            }
        }
        self.vars
            .and_then(|vars| vars.lookup(name))
            .map(Item::Node)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    fn key(
        &mut self,
        view: &NodeView<'q>,
        name: &str,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        if input.is_object() {
            return match input.member(name) {
                Some(value) => self.next(view.next, value, found),
                None if !self.ignore_structural => Err(EvalError::Structural(format!(
                    "JSON object does not contain key \"{name}\""
                ))),
                None => Ok(Outcome::NotFound),
            };
        }
        if unwrap && input.is_array() {
            return self.unwrap_target(view.at, input, found);
        }
        if !self.ignore_structural {
            return Err(EvalError::Structural(
                "jsonpath member accessor can only be applied to an object".to_string(),
            ));
        }
        Ok(Outcome::NotFound)
    }

    fn any_key(
        &mut self,
        view: &NodeView<'q>,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        unwrap: bool,
    ) -> Result<Outcome> {
        if input.is_object() {
            let values = input.entries().into_iter().map(|(_, v)| v).collect();
            return self.each(view.next, values, found);
        }
        if unwrap && input.is_array() {
            return self.unwrap_target(view.at, input, found);
        }
        if !self.ignore_structural {
            return Err(EvalError::Structural(
                "jsonpath wildcard member accessor can only be applied to an object".to_string(),
            ));
        }
        Ok(Outcome::NotFound)
    }

    fn any_array(
        &mut self,
        view: &NodeView<'q>,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        if input.is_array() {
            return self.each(view.next, input.elements(), found);
        }
        if self.auto_wrap() {
            return self.next(view.next, input.clone(), found);
        }
        if !self.ignore_structural {
            return Err(EvalError::Structural(
                "jsonpath wildcard array accessor can only be applied to an array".to_string(),
            ));
        }
        Ok(Outcome::NotFound)
    }

    fn index_array(
        &mut self,
        view: &NodeView<'q>,
        subscripts: Subscripts<'q>,
        input: &Item<'d, D>,
        found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let size = match input.array_len() {
            Some(size) => size,
            None if self.auto_wrap() => 1,
            None if !self.ignore_structural => {
                return Err(EvalError::Structural(
                    "jsonpath array accessor can only be applied to an array".to_string(),
                ));
            }
            None => return Ok(Outcome::NotFound),
        };
        let saved = self.innermost_array_size.replace(size);
        let result = self.subscripts(view, subscripts, input, size, found);
        self.innermost_array_size = saved;
        result
    }

    fn subscripts(
        &mut self,
        view: &NodeView<'q>,
        subscripts: Subscripts<'q>,
        input: &Item<'d, D>,
        size: usize,
        mut found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let wrapped = !input.is_array();
        let size = size as i64;
        let mut outcome = Outcome::NotFound;
        for (from, to) in subscripts {
            let from = self.array_index(from, input)?;
            let to = match to {
                Some(to) => self.array_index(to, input)?,
                None => from,
            };
            if !self.ignore_structural && (from < 0 || from > to || to >= size) {
                return Err(EvalError::Structural(
                    "jsonpath array subscript is out of bounds".to_string(),
                ));
            }
            for index in from.max(0)..=to.min(size - 1) {
                let elem = if wrapped {
                    input.clone()
                } else {
                    match input.element(index as usize) {
                        Some(elem) => elem,
                        None => continue,
                    }
                };
                if self.next(view.next, elem, found.as_deref_mut())? == Outcome::Found {
                    outcome = Outcome::Found;
                    if found.is_none() {
                        return Ok(outcome);
                    }
                }
            }
        }
        Ok(outcome)
    }

    fn array_index(&mut self, at: NodeRef, input: &Item<'d, D>) -> Result<i64> {
        let values = self.collect(at, input, false)?;
        let number = single(values)
            .and_then(|v| v.as_number())
            .ok_or_else(|| {
                EvalError::Structural(
                    "jsonpath array subscript is not a single numeric value".to_string(),
                )
            })?;
        number
            .trunc_i64()
            .filter(|i| i32::try_from(*i).is_ok())
            .ok_or_else(|| {
                EvalError::Structural("jsonpath array subscript is out of integer range".to_string())
            })
    }

    /// `.**{first to last}`: the input itself when `first` is 0, then every
    /// descendant between the bounds.
    fn any(
        &mut self,
        view: &NodeView<'q>,
        bounds: (u32, u32),
        input: &Item<'d, D>,
        mut found: Found<'_, 'd, D>,
    ) -> Result<Outcome> {
        let mut outcome = Outcome::NotFound;
        if bounds.0 == 0 {
            let saved = std::mem::replace(&mut self.ignore_structural, true);
            let result = self.next(view.next, input.clone(), found.as_deref_mut());
            self.ignore_structural = saved;
            if result? == Outcome::Found {
                outcome = Outcome::Found;
                if found.is_none() {
                    return Ok(outcome);
                }
            }
        }
        if input.is_array() || input.is_object() {
            let unwrap = self.auto_unwrap();
            if self.descend(view.next, input, found, 1, bounds, unwrap)? == Outcome::Found {
                outcome = Outcome::Found;
            }
        }
        Ok(outcome)
    }

    fn descend(
        &mut self,
        next: Option<NodeRef>,
        container: &Item<'d, D>,
        found: Found<'_, 'd, D>,
        level: u32,
        bounds: (u32, u32),
        unwrap_next: bool,
    ) -> Result<Outcome> {
        self.guard
            .enter()
            .map_err(|e| EvalError::DepthLimitExceeded(e.limit))?;
        let result = self.descend_inner(next, container, found, level, bounds, unwrap_next);
        self.guard.leave();
        result
    }

    fn descend_inner(
        &mut self,
        next: Option<NodeRef>,
        container: &Item<'d, D>,
        mut found: Found<'_, 'd, D>,
        level: u32,
        (first, last): (u32, u32),
        unwrap_next: bool,
    ) -> Result<Outcome> {
        if level > last {
            return Ok(Outcome::NotFound);
        }
        let children = if container.is_object() {
            container.entries().into_iter().map(|(_, v)| v).collect()
        } else {
            container.elements()
        };
        let leaves_only = first == ANY_LAST && last == ANY_LAST;
        let mut outcome = Outcome::NotFound;
        for child in children {
            self.tick()?;
            let is_container = child.is_array() || child.is_object();
            if level >= first || (leaves_only && !is_container) {
                let hit = match next {
                    Some(next) => {
                        let saved = std::mem::replace(&mut self.ignore_structural, true);
                        let result =
                            self.item_opt_unwrap(next, &child, found.as_deref_mut(), unwrap_next);
                        self.ignore_structural = saved;
                        result? == Outcome::Found
                    }
                    None => {
                        if let Some(found) = found.as_deref_mut() {
                            self.tracer.trace_emit(&child);
                            found.push(child.clone());
                        }
                        true
                    }
                };
                if hit {
                    outcome = Outcome::Found;
                    if found.is_none() {
                        return Ok(outcome);
                    }
                }
            }
            if level < last
                && is_container
                && self.descend(next, &child, found.as_deref_mut(), level + 1, (first, last), unwrap_next)?
                    == Outcome::Found
            {
                outcome = Outcome::Found;
                if found.is_none() {
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }

    /// Evaluate `arg` in boolean context with `input` pushed as the current item.
    pub(super) fn nested_truth(&mut self, arg: NodeRef, input: &Item<'d, D>) -> Result<Truth> {
        self.items.push(input.clone());
        let result = self.truth(arg, input);
        self.items.pop();
        result
    }

    fn operands(&mut self, refs: Refs<'q>, input: &Item<'d, D>) -> Result<Vec<Item<'d, D>>> {
        let mut items = Vec::new();
        for at in refs {
            self.item(at, input, Some(&mut items))?;
        }
        Ok(items)
    }

    fn object(&mut self, pairs: Pairs<'q>, input: &Item<'d, D>) -> Result<Item<'d, D>> {
        let mut members = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let keys = self.collect(key, input, false)?;
            let key = single(keys)
                .and_then(|k| k.as_str().map(str::to_string))
                .ok_or_else(|| {
                    EvalError::SingletonRequired(
                        "key in jsonpath object constructor must be a singleton string".to_string(),
                    )
                })?;
            let values = self.collect(value, input, false)?;
            let value = single(values).ok_or_else(|| {
                EvalError::SingletonRequired(
                    "value in jsonpath object constructor must be a singleton".to_string(),
                )
            })?;
            members.push((key, value));
        }
        Ok(Item::Object(members))
    }

    fn operator(
        &mut self,
        at: NodeRef,
        name: &str,
        cache_id: u32,
        args: Refs<'q>,
        input: &Item<'d, D>,
    ) -> Result<Item<'d, D>> {
        let arity = args.len();
        let resolver = self.resolver;
        let function = self.external(at, cache_id, || {
            resolver
                .operator(name, arity)
                .ok_or_else(|| EvalError::Unresolved(format!("operator {name}/{arity} is not defined")))
        })?;
        let mut scalars = Vec::with_capacity(arity);
        for arg in args {
            let values = self.collect(arg, input, true)?;
            let scalar = single(values)
                .and_then(|v| v.to_scalar())
                .ok_or_else(|| {
                    EvalError::SingletonRequired(format!(
                        "argument of operator {name} is not a single scalar value"
                    ))
                })?;
            scalars.push(scalar);
        }
        let result = function(&scalars)
            .map_err(|message| EvalError::Unresolved(format!("operator {name} failed: {message}")))?;
        Ok(Item::from_scalar(result))
    }

    fn cast(
        &mut self,
        at: NodeRef,
        arg: NodeRef,
        type_name: &str,
        cache_id: u32,
        input: &Item<'d, D>,
    ) -> Result<Item<'d, D>> {
        let resolver = self.resolver;
        let function = self.external(at, cache_id, || {
            resolver
                .cast(type_name)
                .ok_or_else(|| EvalError::Unresolved(format!("cast to {type_name} is not defined")))
        })?;
        let values = self.collect(arg, input, true)?;
        let scalar = single(values)
            .and_then(|v| v.to_scalar())
            .ok_or_else(|| {
                EvalError::SingletonRequired(format!(
                    "operand of cast to {type_name} is not a single scalar value"
                ))
            })?;
        let result = function(std::slice::from_ref(&scalar)).map_err(|message| {
            EvalError::Unresolved(format!("cast to {type_name} failed: {message}"))
        })?;
        Ok(Item::from_scalar(result))
    }

    /// Resolved function for `cache_id`, asking the resolver on first use.
    fn external(
        &mut self,
        at: NodeRef,
        cache_id: u32,
        resolve: impl FnOnce() -> Result<ExternalFn>,
    ) -> Result<ExternalFn> {
        if cache_id >= self.query.external_count() {
            return Err(malformed(at, "cache id out of range"));
        }
        let index = cache_id as usize;
        if self.externals.len() <= index {
            self.externals.resize(index + 1, None);
        }
        if let Some(function) = &self.externals[index] {
            return Ok(function.clone());
        }
        let function = resolve()?;
        self.externals[index] = Some(function.clone());
        Ok(function)
    }
}
