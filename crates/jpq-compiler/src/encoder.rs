//! Parse tree to compiled query.
//!
//! Nodes are written pre-order: a composite node reserves its operand slots,
//! then encodes the operands after itself and patches the slots with their
//! offsets relative to the node. Cache ids are handed out post-order, after
//! an operator's arguments.

use jpq_bytecode::{ByteBuf, CompiledQuery, Header, RegexFlags, Tag};
use jpq_core::{DepthGuard, DocKind, Document, Mode, Scalar, Variables};
use serde_json::Value;

use crate::parse_tree::{ParseNode, PathItem};
use crate::{EncodeError, Result, to_parse_tree};

/// Encode `tree` without variable bindings.
pub fn encode(tree: &ParseNode, mode: Mode) -> Result<CompiledQuery> {
    Encoder::new().mode(mode).encode(tree)
}

/// New compiled query with every variable bound in `vars` replaced by its value.
///
/// Lambda parameters shadow bindings; names missing from `vars` stay as
/// variable references and are resolved at evaluation time.
pub fn bind<D: Document>(query: &CompiledQuery, vars: &dyn Variables<D>) -> Result<CompiledQuery> {
    let tree = to_parse_tree(query)?;
    Encoder::new().mode(query.mode()).vars(vars).encode(&tree)
}

/// Encoder configuration.
pub struct Encoder<'v, D = Value> {
    mode: Mode,
    recursion_limit: u32,
    stack_budget: usize,
    vars: Option<&'v dyn Variables<D>>,
}

impl Default for Encoder<'_, Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<'_, Value> {
    pub fn new() -> Self {
        Self {
            mode: Mode::Lax,
            recursion_limit: DepthGuard::DEFAULT_LIMIT,
            stack_budget: DepthGuard::DEFAULT_STACK_BUDGET,
            vars: None,
        }
    }
}

impl<'v, D: Document> Encoder<'v, D> {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Stack bytes the recursive encoder may use.
    pub fn stack_budget(mut self, bytes: usize) -> Self {
        self.stack_budget = bytes;
        self
    }

    /// Splice bound values in place of `$name` references.
    pub fn vars<E: Document>(self, vars: &'v dyn Variables<E>) -> Encoder<'v, E> {
        Encoder {
            mode: self.mode,
            recursion_limit: self.recursion_limit,
            stack_budget: self.stack_budget,
            vars: Some(vars),
        }
    }

    pub fn encode(&self, tree: &ParseNode) -> Result<CompiledQuery> {
        let mut ctx = EncodeContext {
            buf: ByteBuf::with_header(&Header::new(self.mode)),
            vars: self.vars,
            next_cache_id: 0,
            level: 0,
            lambdas: Vec::new(),
            subscript_depth: 0,
            lambda_slot: false,
            guard: DepthGuard::new(self.recursion_limit).with_stack_budget(self.stack_budget),
        };
        ctx.node(tree)?;
        ctx.buf.set_external_count(ctx.next_cache_id);
        Ok(CompiledQuery::from_bytes(ctx.buf.finish())?)
    }
}

struct EncodeContext<'v, D> {
    buf: ByteBuf,
    vars: Option<&'v dyn Variables<D>>,
    next_cache_id: u32,
    /// Item stack level of the innermost filter or lambda; 0 at the top.
    level: u32,
    /// Enclosing lambdas, innermost last: body level and parameter names.
    lambdas: Vec<(u32, Vec<String>)>,
    subscript_depth: u32,
    /// The node about to be encoded is the lambda operand of a higher-order call.
    lambda_slot: bool,
    guard: DepthGuard,
}

fn tag_of(item: &PathItem) -> Tag {
    match item {
        PathItem::Null => Tag::Null,
        PathItem::Bool { .. } => Tag::Bool,
        PathItem::Numeric { .. } => Tag::Numeric,
        PathItem::String { .. } => Tag::String,
        PathItem::Key { .. } => Tag::Key,
        PathItem::Current { .. } => Tag::Current,
        PathItem::Root => Tag::Root,
        PathItem::Variable { .. } => Tag::Variable,
        PathItem::Last => Tag::Last,
        PathItem::AnyKey => Tag::AnyKey,
        PathItem::AnyArray => Tag::AnyArray,
        PathItem::IndexArray { .. } => Tag::IndexArray,
        PathItem::Any { .. } => Tag::Any,
        PathItem::Binary { op, .. } => Tag::Binary(*op),
        PathItem::LikeRegex { .. } => Tag::LikeRegex,
        PathItem::Unary { op, .. } => Tag::Unary(*op),
        PathItem::Filter { .. } => Tag::Filter,
        PathItem::Method { method } => Tag::Method(*method),
        PathItem::Sequence { .. } => Tag::Sequence,
        PathItem::Array { .. } => Tag::Array,
        PathItem::Object { .. } => Tag::Object,
        PathItem::Operator { .. } => Tag::Operator,
        PathItem::Cast { .. } => Tag::Cast,
        PathItem::Lambda { .. } => Tag::Lambda,
        PathItem::HigherOrder { kind, .. } => Tag::HigherOrder(*kind),
    }
}

/// Compile-time check of a `like_regex` pattern with its flags applied.
fn check_regex(pattern: &str, flags: RegexFlags) -> Result<()> {
    let escaped;
    let source = if flags.contains(RegexFlags::QUOTE) {
        escaped = regex_syntax::escape(pattern);
        escaped.as_str()
    } else {
        pattern
    };
    regex_syntax::ParserBuilder::new()
        .case_insensitive(flags.contains(RegexFlags::CASE_INSENSITIVE))
        .dot_matches_new_line(flags.contains(RegexFlags::DOT_ALL))
        .multi_line(flags.contains(RegexFlags::MULTI_LINE))
        .ignore_whitespace(flags.contains(RegexFlags::EXTENDED))
        .build()
        .parse(source)
        .map_err(|e| EncodeError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

impl<D: Document> EncodeContext<'_, D> {
    fn rel(&self, node: usize, child: usize) -> Result<i32> {
        i32::try_from(child - node).map_err(|_| EncodeError::TooLarge)
    }

    fn patch(&mut self, node: usize, slot: usize, child: usize) -> Result<()> {
        let rel = self.rel(node, child)?;
        self.buf.patch_i32(slot, rel);
        Ok(())
    }

    fn is_param(&self, name: &str) -> bool {
        self.lambdas
            .iter()
            .any(|(_, params)| params.iter().any(|p| p == name))
    }

    /// Encode `node` and its `next` chain; returns the node's offset.
    fn node(&mut self, node: &ParseNode) -> Result<usize> {
        self.guard
            .enter()
            .map_err(|e| EncodeError::DepthLimitExceeded(e.limit))?;
        let result = self.node_inner(node);
        self.guard.leave();
        result
    }

    fn node_inner(&mut self, node: &ParseNode) -> Result<usize> {
        let lambda_allowed = std::mem::take(&mut self.lambda_slot);
        let ids_before = self.next_cache_id;

        let bound = match (&node.item, self.vars) {
            (PathItem::Variable { name }, Some(vars)) if !self.is_param(name) => vars.lookup(name),
            _ => None,
        };
        let at = match bound {
            Some(value) => self.value(value)?,
            None => self.item(&node.item, lambda_allowed)?,
        };

        if let Some(next) = &node.next {
            let next_at = self.node(next)?;
            let rel = self.rel(at, next_at)?;
            self.buf.set_next(at, rel);
        }
        if self.next_cache_id != ids_before {
            self.buf.mark_external(at);
        }
        Ok(at)
    }

    /// Payload of one path item, without its `next` link.
    fn item(&mut self, item: &PathItem, lambda_allowed: bool) -> Result<usize> {
        let tag = match item {
            PathItem::Root if !self.lambdas.is_empty() => Tag::Current,
            _ => tag_of(item),
        };
        let at = self.buf.begin_node(tag);
        match item {
            PathItem::Null
            | PathItem::AnyKey
            | PathItem::AnyArray
            | PathItem::Method { .. } => {}
            PathItem::Root => {
                // `$` inside a lambda body is the lambda's input.
                if let Some(&(level, _)) = self.lambdas.last() {
                    self.buf.push_u32(level);
                }
            }
            PathItem::Last => {
                if self.subscript_depth == 0 {
                    return Err(EncodeError::LastOutsideSubscript);
                }
            }
            PathItem::Bool { value } => self.buf.push_u32(u32::from(*value)),
            PathItem::Numeric { value } => self.buf.push_str(&value.to_blob()),
            PathItem::String { value } => self.buf.push_str(value),
            PathItem::Key { name } | PathItem::Variable { name } => self.buf.push_str(name),
            PathItem::Current { level } => {
                let level = self.resolve_level(*level)?;
                self.buf.push_u32(level);
            }
            PathItem::Any { first, last } => {
                self.buf.push_u32(*first);
                self.buf.push_u32(*last);
            }
            PathItem::IndexArray { subscripts } => {
                self.buf.push_u32(list_len(subscripts.len())?);
                let slots: Vec<(usize, usize)> = subscripts
                    .iter()
                    .map(|_| (self.buf.reserve(), self.buf.reserve()))
                    .collect();
                self.subscript_depth += 1;
                let result = (|| -> Result<()> {
                    for (subscript, (from_slot, to_slot)) in subscripts.iter().zip(slots) {
                        let from = self.node(&subscript.from)?;
                        self.patch(at, from_slot, from)?;
                        if let Some(to) = &subscript.to {
                            let to = self.node(to)?;
                            self.patch(at, to_slot, to)?;
                        }
                    }
                    Ok(())
                })();
                self.subscript_depth -= 1;
                result?;
            }
            PathItem::Binary { left, right, .. } => {
                let left_slot = self.buf.reserve();
                let right_slot = self.buf.reserve();
                let left = self.node(left)?;
                self.patch(at, left_slot, left)?;
                let right = self.node(right)?;
                self.patch(at, right_slot, right)?;
            }
            PathItem::LikeRegex {
                expr,
                pattern,
                flags,
            } => {
                check_regex(pattern, *flags)?;
                let slot = self.buf.reserve();
                self.buf.push_u32(flags.bits());
                self.buf.push_str(pattern);
                let expr = self.node(expr)?;
                self.patch(at, slot, expr)?;
            }
            PathItem::Unary { arg, .. } => {
                let slot = self.buf.reserve();
                let arg = self.node(arg)?;
                self.patch(at, slot, arg)?;
            }
            PathItem::Filter { arg } => {
                let slot = self.buf.reserve();
                self.level += 1;
                let arg = self.node(arg);
                self.level -= 1;
                self.patch(at, slot, arg?)?;
            }
            PathItem::Sequence { items } | PathItem::Array { items } => {
                self.buf.push_u32(list_len(items.len())?);
                self.operands(at, items)?;
            }
            PathItem::Object { members } => {
                self.buf.push_u32(list_len(members.len())?);
                let slots: Vec<(usize, usize)> = members
                    .iter()
                    .map(|_| (self.buf.reserve(), self.buf.reserve()))
                    .collect();
                for (member, (key_slot, value_slot)) in members.iter().zip(slots) {
                    let key = self.node(&member.key)?;
                    self.patch(at, key_slot, key)?;
                    let value = self.node(&member.value)?;
                    self.patch(at, value_slot, value)?;
                }
            }
            PathItem::Operator { name, args } => {
                let id_slot = self.buf.reserve();
                self.buf.push_u32(list_len(args.len())?);
                let slots: Vec<usize> = args.iter().map(|_| self.buf.reserve()).collect();
                self.buf.push_str(name);
                for (arg, slot) in args.iter().zip(slots) {
                    let arg = self.node(arg)?;
                    self.patch(at, slot, arg)?;
                }
                let id = self.allocate_cache_id();
                self.buf.patch_u32(id_slot, id);
            }
            PathItem::Cast { arg, type_name } => {
                let arg_slot = self.buf.reserve();
                let id_slot = self.buf.reserve();
                self.buf.push_str(type_name);
                let arg = self.node(arg)?;
                self.patch(at, arg_slot, arg)?;
                let id = self.allocate_cache_id();
                self.buf.patch_u32(id_slot, id);
            }
            PathItem::Lambda { params, body } => {
                if !lambda_allowed {
                    return Err(EncodeError::LambdaOutsideCall);
                }
                if params.len() > 3 {
                    return Err(EncodeError::TooManyParams(params.len()));
                }
                self.buf.push_u32(list_len(params.len())?);
                let slot = self.buf.reserve();
                for param in params {
                    self.buf.push_str(param);
                }
                self.level += 1;
                self.lambdas.push((self.level, params.clone()));
                let body = self.node(body);
                self.lambdas.pop();
                self.level -= 1;
                self.patch(at, slot, body?)?;
            }
            PathItem::HigherOrder {
                kind,
                array,
                lambda,
                seed,
            } => {
                let array_slot = self.buf.reserve();
                let lambda_slot = self.buf.reserve();
                let seed_slot = self.buf.reserve();
                if let Some(array) = array {
                    let array = self.node(array)?;
                    self.patch(at, array_slot, array)?;
                }
                if let Some(lambda) = lambda {
                    if !matches!(lambda.item, PathItem::Lambda { .. }) {
                        return Err(EncodeError::LambdaExpected {
                            function: kind.as_str(),
                        });
                    }
                    self.lambda_slot = true;
                    let lambda = self.node(lambda)?;
                    self.patch(at, lambda_slot, lambda)?;
                }
                if let Some(seed) = seed {
                    let seed = self.node(seed)?;
                    self.patch(at, seed_slot, seed)?;
                }
            }
        }
        Ok(at)
    }

    fn operands(&mut self, at: usize, items: &[ParseNode]) -> Result<()> {
        let slots: Vec<usize> = items.iter().map(|_| self.buf.reserve()).collect();
        for (item, slot) in items.iter().zip(slots) {
            let item = self.node(item)?;
            self.patch(at, slot, item)?;
        }
        Ok(())
    }

    fn resolve_level(&self, level: Option<u32>) -> Result<u32> {
        match level {
            None if self.level == 0 => Err(EncodeError::CurrentOutsideFilter),
            None => Ok(self.level),
            Some(level) if level == 0 || level > self.level => Err(EncodeError::InvalidLevel {
                level,
                innermost: self.level,
            }),
            Some(level) => Ok(level),
        }
    }

    fn allocate_cache_id(&mut self) -> u32 {
        let id = self.next_cache_id;
        self.next_cache_id += 1;
        id
    }

    /// Literal or constructor nodes for a bound variable value.
    fn value(&mut self, value: &D) -> Result<usize> {
        self.guard
            .enter()
            .map_err(|e| EncodeError::DepthLimitExceeded(e.limit))?;
        let result = self.value_inner(value);
        self.guard.leave();
        result
    }

    fn value_inner(&mut self, value: &D) -> Result<usize> {
        let at = match Scalar::from_document(value) {
            Some(Scalar::Null) => self.buf.begin_node(Tag::Null),
            Some(Scalar::Bool(b)) => {
                let at = self.buf.begin_node(Tag::Bool);
                self.buf.push_u32(u32::from(b));
                at
            }
            Some(Scalar::Number(n)) => {
                let at = self.buf.begin_node(Tag::Numeric);
                self.buf.push_str(&n.to_blob());
                at
            }
            Some(Scalar::String(s)) => {
                let at = self.buf.begin_node(Tag::String);
                self.buf.push_str(&s);
                at
            }
            None if value.kind() == DocKind::Array => {
                let at = self.buf.begin_node(Tag::Array);
                self.buf.push_u32(list_len(value.len())?);
                let slots: Vec<usize> = (0..value.len()).map(|_| self.buf.reserve()).collect();
                for ((_, elem), slot) in value.members().zip(slots) {
                    let elem = self.value(elem)?;
                    self.patch(at, slot, elem)?;
                }
                at
            }
            None => {
                let at = self.buf.begin_node(Tag::Object);
                self.buf.push_u32(list_len(value.len())?);
                let slots: Vec<(usize, usize)> = (0..value.len())
                    .map(|_| (self.buf.reserve(), self.buf.reserve()))
                    .collect();
                for ((key, member), (key_slot, value_slot)) in value.members().zip(slots) {
                    let key_at = self.buf.begin_node(Tag::String);
                    self.buf.push_str(key.unwrap_or_default());
                    self.patch(at, key_slot, key_at)?;
                    let member = self.value(member)?;
                    self.patch(at, value_slot, member)?;
                }
                at
            }
        };
        Ok(at)
    }
}

fn list_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EncodeError::TooLarge)
}
