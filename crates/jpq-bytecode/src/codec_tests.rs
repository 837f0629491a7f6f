use jpq_core::Mode;

use crate::codec::{ByteBuf, MIN_QUERY_SIZE};
use crate::header::{HEADER_SIZE, Header};
use crate::tag::{FLAG_EXTERNAL, Tag};

#[test]
fn starts_with_header() {
    let buf = ByteBuf::with_header(&Header::new(Mode::Strict));
    assert_eq!(buf.len(), HEADER_SIZE);
    assert_eq!(&buf.as_slice()[..4], b"JPQ1");
    assert_eq!(MIN_QUERY_SIZE, 20);
}

#[test]
fn strings_are_length_prefixed_and_padded() {
    let mut buf = ByteBuf::default();
    buf.push_str("abcde");

    assert_eq!(buf.len(), 12);
    assert_eq!(&buf.as_slice()[..4], &5u32.to_le_bytes());
    assert_eq!(&buf.as_slice()[4..9], b"abcde");
    assert_eq!(&buf.as_slice()[9..], &[0, 0, 0]);
}

#[test]
fn empty_string_takes_only_the_length() {
    let mut buf = ByteBuf::default();
    buf.push_str("");
    assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn nodes_are_aligned() {
    let mut buf = ByteBuf::with_header(&Header::default());
    buf.push_bytes(&[1]);
    let at = buf.begin_node(Tag::Root);

    assert_eq!(at % 4, 0);
    assert_eq!(at, 20);
    assert_eq!(buf.as_slice()[at], Tag::Root.to_byte());
}

#[test]
fn reserved_slots_are_patched() {
    let mut buf = ByteBuf::with_header(&Header::default());
    let node = buf.begin_node(Tag::Filter);
    let slot = buf.reserve();
    buf.patch_i32(slot, 8);
    buf.set_next(node, 16);

    let bytes = buf.finish();
    assert_eq!(&bytes[slot..slot + 4], &8i32.to_le_bytes());
    assert_eq!(&bytes[node + 4..node + 8], &16i32.to_le_bytes());
}

#[test]
fn external_flag_and_count() {
    let mut buf = ByteBuf::with_header(&Header::default());
    let node = buf.begin_node(Tag::Operator);
    buf.mark_external(node);
    buf.set_external_count(3);

    let bytes = buf.finish();
    assert_eq!(bytes[node + 1], FLAG_EXTERNAL);
    assert_eq!(Header::from_bytes(&bytes).external_count, 3);
}
