#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Binary format of compiled path queries.
//!
//! This crate contains:
//! - Format definitions ([`Header`], [`Tag`], node payload layout)
//! - The writer used by the encoder ([`ByteBuf`])
//! - The allocation-free reader ([`CompiledQuery::view`], [`Node`])
//! - Textual rendering and a debug dump

pub mod codec;
pub mod dump;
pub mod header;
pub mod query;
pub mod render;
pub mod tag;

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod header_tests;
#[cfg(test)]
mod query_tests;
#[cfg(test)]
mod tag_tests;

pub use codec::ByteBuf;
pub use dump::dump;
pub use header::{HEADER_SIZE, Header, LAX_FLAG, MAGIC, VERSION};
pub use query::{
    CompiledQuery, DecodeError, Node, NodeRef, NodeView, Pairs, Params, Refs, Subscripts,
};
pub use render::render;
pub use tag::{
    ANY_LAST, BinaryOp, FLAG_EXTERNAL, HigherOrderKind, Method, NODE_HEADER_SIZE, RegexFlags,
    Tag, UnaryOp,
};
