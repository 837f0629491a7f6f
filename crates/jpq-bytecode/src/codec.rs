//! Writer for compiled query buffers.
//!
//! All integers are little-endian. Variable-length payloads (strings, number
//! blobs) are a `u32` byte length followed by the bytes, zero-padded to the
//! next 4-byte boundary so the following field or node stays aligned.

use crate::header::{HEADER_SIZE, Header};
use crate::tag::{FLAG_EXTERNAL, NODE_HEADER_SIZE, Tag};

/// Growable byte buffer with slot patching for forward references.
#[derive(Clone, Debug, Default)]
pub struct ByteBuf {
    bytes: Vec<u8>,
}

impl ByteBuf {
    /// Start a buffer with `header` already written.
    pub fn with_header(header: &Header) -> Self {
        let mut bytes = Vec::with_capacity(128);
        bytes.extend_from_slice(&header.to_bytes());
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Write a node header and return the node's offset.
    pub fn begin_node(&mut self, tag: Tag) -> usize {
        self.align();
        let at = self.bytes.len();
        self.bytes.extend_from_slice(&[tag.to_byte(), 0, 0, 0]);
        self.push_i32(0);
        at
    }

    pub fn push_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn push_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Reserve an `i32` offset slot, returning its position for [`patch_i32`](Self::patch_i32).
    pub fn reserve(&mut self) -> usize {
        let at = self.bytes.len();
        self.push_i32(0);
        at
    }

    /// Length-prefixed bytes, padded to 4.
    pub fn push_bytes(&mut self, data: &[u8]) {
        let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        self.push_u32(len);
        self.bytes.extend_from_slice(data);
        self.align();
    }

    pub fn push_str(&mut self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    pub fn align(&mut self) {
        let padded = self.bytes.len().next_multiple_of(4);
        self.bytes.resize(padded, 0);
    }

    pub fn patch_i32(&mut self, at: usize, value: i32) {
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Point node `at`'s `next` slot to `next`.
    pub fn set_next(&mut self, at: usize, next: i32) {
        self.patch_i32(at + 4, next);
    }

    pub fn mark_external(&mut self, at: usize) {
        self.bytes[at + 1] |= FLAG_EXTERNAL;
    }

    /// Record the number of external cache slots in the header.
    pub fn set_external_count(&mut self, count: u32) {
        self.patch_u32(8, count);
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Header size plus the smallest node: anything shorter cannot hold a query.
pub const MIN_QUERY_SIZE: usize = HEADER_SIZE + NODE_HEADER_SIZE;
