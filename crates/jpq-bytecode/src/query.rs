//! Compiled query container and the node reader.
//!
//! Nodes are decoded lazily via [`CompiledQuery::view`]. A view borrows the
//! buffer: strings are `&str` slices into it and operand lists are iterators
//! over validated offset slots, so reading a node never allocates.

use jpq_core::{Mode, Numeric};

use crate::codec::MIN_QUERY_SIZE;
use crate::header::{HEADER_SIZE, Header, VERSION};
use crate::tag::{
    BinaryOp, FLAG_EXTERNAL, HigherOrderKind, Method, NODE_HEADER_SIZE, RegexFlags, Tag, UnaryOp,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid magic: expected JPQ1")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u8),
    #[error("buffer too small: {0} bytes (minimum {MIN_QUERY_SIZE})")]
    BufferTooSmall(usize),
    #[error("malformed query at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
}

fn malformed(offset: usize, reason: &'static str) -> DecodeError {
    DecodeError::Malformed { offset, reason }
}

/// Absolute byte offset of a node inside a [`CompiledQuery`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);

impl NodeRef {
    pub fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

/// An encoded query: header plus node forest, root node first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledQuery {
    bytes: Vec<u8>,
    header: Header,
}

impl CompiledQuery {
    /// Validate the header and take ownership of `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        if bytes.len() < MIN_QUERY_SIZE {
            return Err(DecodeError::BufferTooSmall(bytes.len()));
        }

        let header = Header::from_bytes(&bytes[..HEADER_SIZE]);

        if !header.validate_magic() {
            return Err(DecodeError::InvalidMagic);
        }
        if !header.validate_version() {
            return Err(DecodeError::UnsupportedVersion(header.version));
        }

        Ok(Self { bytes, header })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mode(&self) -> Mode {
        self.header.mode
    }

    pub fn is_lax(&self) -> bool {
        self.header.mode.is_lax()
    }

    pub fn external_count(&self) -> u32 {
        self.header.external_count
    }

    pub fn root(&self) -> NodeRef {
        NodeRef(HEADER_SIZE as u32)
    }

    pub fn root_view(&self) -> Result<NodeView<'_>, DecodeError> {
        self.view(self.root())
    }

    /// Decode the node at `at`. Every offset the view hands out has been
    /// bounds-checked and points forward.
    pub fn view(&self, at: NodeRef) -> Result<NodeView<'_>, DecodeError> {
        let start = at.offset();
        let bytes = self.bytes.as_slice();
        if start < HEADER_SIZE || start % 4 != 0 || start + NODE_HEADER_SIZE > bytes.len() {
            return Err(malformed(start, "node offset out of bounds"));
        }

        let r = Reader { bytes, node: start };
        let tag = Tag::from_byte(bytes[start]).ok_or(malformed(start, "unknown node tag"))?;
        let flags = bytes[start + 1];
        let next = r.child(start + 4)?;
        let p = start + NODE_HEADER_SIZE;

        let node = match tag {
            Tag::Null => Node::Null,
            Tag::Bool => Node::Bool(r.u32(p)? != 0),
            Tag::Numeric => {
                let (blob, _) = r.bytes(p)?;
                let value =
                    Numeric::from_blob(blob).ok_or(malformed(p, "invalid numeric payload"))?;
                Node::Numeric(value)
            }
            Tag::String => Node::String(r.str(p)?.0),
            Tag::Key => Node::Key(r.str(p)?.0),
            Tag::Current => Node::Current { level: r.u32(p)? },
            Tag::Root => Node::Root,
            Tag::Variable => Node::Variable(r.str(p)?.0),
            Tag::Last => Node::Last,
            Tag::AnyKey => Node::AnyKey,
            Tag::AnyArray => Node::AnyArray,
            Tag::IndexArray => {
                let count = r.u32(p)?;
                let list = p + 4;
                r.check_span(list, count, 8)?;
                for i in 0..count as usize {
                    r.required_child(list + 8 * i)?;
                    r.child(list + 8 * i + 4)?;
                }
                Node::IndexArray(Subscripts {
                    slots: Slots::new(bytes, start, list, count),
                })
            }
            Tag::Any => Node::Any {
                first: r.u32(p)?,
                last: r.u32(p + 4)?,
            },
            Tag::Binary(op) => Node::Binary {
                op,
                left: r.required_child(p)?,
                right: r.required_child(p + 4)?,
            },
            Tag::LikeRegex => {
                let expr = r.required_child(p)?;
                let flags = RegexFlags::from_bits(r.u32(p + 4)?)
                    .ok_or(malformed(p + 4, "unknown like_regex flags"))?;
                let pattern = r.str(p + 8)?.0;
                Node::LikeRegex {
                    expr,
                    pattern,
                    flags,
                }
            }
            Tag::Unary(op) => Node::Unary {
                op,
                arg: r.required_child(p)?,
            },
            Tag::Filter => Node::Filter(r.required_child(p)?),
            Tag::Method(method) => Node::Method(method),
            Tag::Sequence => Node::Sequence(r.refs(p)?.0),
            Tag::Array => Node::Array(r.refs(p)?.0),
            Tag::Object => {
                let count = r.u32(p)?;
                let list = p + 4;
                r.check_span(list, count, 8)?;
                for i in 0..count as usize {
                    r.required_child(list + 8 * i)?;
                    r.required_child(list + 8 * i + 4)?;
                }
                Node::Object(Pairs {
                    slots: Slots::new(bytes, start, list, count),
                })
            }
            Tag::Operator => {
                let cache_id = r.u32(p)?;
                let (args, end) = r.refs(p + 4)?;
                let name = r.str(end)?.0;
                Node::Operator {
                    name,
                    cache_id,
                    args,
                }
            }
            Tag::Cast => Node::Cast {
                arg: r.required_child(p)?,
                cache_id: r.u32(p + 4)?,
                type_name: r.str(p + 8)?.0,
            },
            Tag::Lambda => {
                let count = r.u32(p)?;
                let body = r.required_child(p + 4)?;
                let first = p + 8;
                let mut pos = first;
                for _ in 0..count {
                    pos = r.str(pos)?.1;
                }
                Node::Lambda {
                    params: Params {
                        bytes,
                        pos: first,
                        remaining: count,
                    },
                    body,
                }
            }
            Tag::HigherOrder(kind) => Node::HigherOrder {
                kind,
                array: r.child(p)?,
                lambda: r.child(p + 4)?,
                seed: r.child(p + 8)?,
            },
        };

        Ok(NodeView {
            at,
            tag,
            flags,
            next,
            node,
        })
    }
}

/// A decoded node: common header fields plus the typed payload.
#[derive(Clone, Debug)]
pub struct NodeView<'q> {
    pub at: NodeRef,
    pub tag: Tag,
    pub flags: u8,
    /// Next step of the same path chain.
    pub next: Option<NodeRef>,
    pub node: Node<'q>,
}

impl NodeView<'_> {
    /// Whether evaluating this node (or anything below it) needs an external cache slot.
    pub fn is_external(&self) -> bool {
        self.flags & FLAG_EXTERNAL != 0
    }
}

/// Typed payload of a node.
#[derive(Clone, Debug)]
pub enum Node<'q> {
    Null,
    Bool(bool),
    Numeric(Numeric),
    String(&'q str),
    Key(&'q str),
    /// `@`, resolved to the item stack level it reads.
    Current {
        level: u32,
    },
    Root,
    Variable(&'q str),
    Last,
    AnyKey,
    AnyArray,
    IndexArray(Subscripts<'q>),
    /// `.**{first to last}`; [`ANY_LAST`](crate::ANY_LAST) stands for `last`.
    Any {
        first: u32,
        last: u32,
    },
    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    },
    LikeRegex {
        expr: NodeRef,
        pattern: &'q str,
        flags: RegexFlags,
    },
    Unary {
        op: UnaryOp,
        arg: NodeRef,
    },
    Filter(NodeRef),
    Method(Method),
    Sequence(Refs<'q>),
    Array(Refs<'q>),
    Object(Pairs<'q>),
    Operator {
        name: &'q str,
        cache_id: u32,
        args: Refs<'q>,
    },
    Cast {
        arg: NodeRef,
        type_name: &'q str,
        cache_id: u32,
    },
    Lambda {
        params: Params<'q>,
        body: NodeRef,
    },
    HigherOrder {
        kind: HigherOrderKind,
        array: Option<NodeRef>,
        lambda: Option<NodeRef>,
        seed: Option<NodeRef>,
    },
}

/// Fixed-stride run of already validated offset slots.
#[derive(Clone, Debug)]
struct Slots<'q> {
    bytes: &'q [u8],
    node: usize,
    pos: usize,
    remaining: u32,
}

impl<'q> Slots<'q> {
    fn new(bytes: &'q [u8], node: usize, pos: usize, remaining: u32) -> Self {
        Self {
            bytes,
            node,
            pos,
            remaining,
        }
    }

    fn slot(&self, at: usize) -> Option<NodeRef> {
        let raw = i32::from_le_bytes(self.bytes.get(at..at + 4)?.try_into().ok()?);
        (raw > 0).then(|| NodeRef((self.node + raw as usize) as u32))
    }

    fn take(&mut self, stride: usize) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let at = self.pos;
        self.pos += stride;
        Some(at)
    }
}

/// Operand list of a sequence, array constructor or operator.
#[derive(Clone, Debug)]
pub struct Refs<'q> {
    slots: Slots<'q>,
}

impl Iterator for Refs<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let at = self.slots.take(4)?;
        self.slots.slot(at)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.slots.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Refs<'_> {}

/// `[from to to]` subscripts of an array accessor.
#[derive(Clone, Debug)]
pub struct Subscripts<'q> {
    slots: Slots<'q>,
}

impl Iterator for Subscripts<'_> {
    type Item = (NodeRef, Option<NodeRef>);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.slots.take(8)?;
        Some((self.slots.slot(at)?, self.slots.slot(at + 4)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.slots.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Subscripts<'_> {}

/// `key: value` members of an object constructor.
#[derive(Clone, Debug)]
pub struct Pairs<'q> {
    slots: Slots<'q>,
}

impl Iterator for Pairs<'_> {
    type Item = (NodeRef, NodeRef);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.slots.take(8)?;
        Some((self.slots.slot(at)?, self.slots.slot(at + 4)?))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.slots.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Pairs<'_> {}

/// Parameter names of a lambda.
#[derive(Clone, Debug)]
pub struct Params<'q> {
    bytes: &'q [u8],
    pos: usize,
    remaining: u32,
}

impl<'q> Iterator for Params<'q> {
    type Item = &'q str;

    fn next(&mut self) -> Option<&'q str> {
        if self.remaining == 0 {
            return None;
        }
        let len = u32::from_le_bytes(self.bytes.get(self.pos..self.pos + 4)?.try_into().ok()?);
        let start = self.pos + 4;
        let end = start + len as usize;
        let name = std::str::from_utf8(self.bytes.get(start..end)?).ok()?;
        self.pos = end.next_multiple_of(4);
        self.remaining -= 1;
        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Params<'_> {}

/// Bounds-checked field access relative to one node.
struct Reader<'q> {
    bytes: &'q [u8],
    node: usize,
}

impl<'q> Reader<'q> {
    fn u32(&self, at: usize) -> Result<u32, DecodeError> {
        let slice = self
            .bytes
            .get(at..at + 4)
            .ok_or(malformed(at, "field past end of buffer"))?;
        Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }

    fn i32(&self, at: usize) -> Result<i32, DecodeError> {
        self.u32(at).map(|v| v as i32)
    }

    /// Offset slot at `at`: 0 is `None`; anything else must land on a node
    /// header strictly after this node.
    fn child(&self, at: usize) -> Result<Option<NodeRef>, DecodeError> {
        let raw = self.i32(at)?;
        if raw == 0 {
            return Ok(None);
        }
        if raw < 0 {
            return Err(malformed(at, "offset points backwards"));
        }
        let target = self.node + raw as usize;
        if target % 4 != 0 || target + NODE_HEADER_SIZE > self.bytes.len() {
            return Err(malformed(at, "offset out of bounds"));
        }
        let target = u32::try_from(target).map_err(|_| malformed(at, "offset out of bounds"))?;
        Ok(Some(NodeRef(target)))
    }

    fn required_child(&self, at: usize) -> Result<NodeRef, DecodeError> {
        self.child(at)?.ok_or(malformed(at, "missing operand"))
    }

    /// Length-prefixed bytes; also returns the aligned position after them.
    fn bytes(&self, at: usize) -> Result<(&'q [u8], usize), DecodeError> {
        let len = self.u32(at)? as usize;
        let start = at + 4;
        let data = start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(malformed(at, "string past end of buffer"))?;
        Ok((data, (start + len).next_multiple_of(4)))
    }

    fn str(&self, at: usize) -> Result<(&'q str, usize), DecodeError> {
        let (data, end) = self.bytes(at)?;
        let text = std::str::from_utf8(data).map_err(|_| malformed(at, "string is not UTF-8"))?;
        Ok((text, end))
    }

    fn check_span(&self, pos: usize, count: u32, stride: usize) -> Result<(), DecodeError> {
        let fits = (count as usize)
            .checked_mul(stride)
            .and_then(|span| pos.checked_add(span))
            .is_some_and(|end| end <= self.bytes.len());
        if fits {
            Ok(())
        } else {
            Err(malformed(pos, "operand list past end of buffer"))
        }
    }

    /// `u32` count followed by that many required offset slots.
    fn refs(&self, at: usize) -> Result<(Refs<'q>, usize), DecodeError> {
        let count = self.u32(at)?;
        let list = at + 4;
        self.check_span(list, count, 4)?;
        for i in 0..count as usize {
            self.required_child(list + 4 * i)?;
        }
        let refs = Refs {
            slots: Slots::new(self.bytes, self.node, list, count),
        };
        Ok((refs, list + 4 * count as usize))
    }
}
