//! Document side: the entries an indexed document contributes.

use indexmap::IndexSet;
use jpq_core::{Document, Scalar, Token, hash_key, hash_scalar, tokens};

use crate::entry::{Entry, Scheme};

/// Entries for `doc`, deduplicated, in first-seen order.
///
/// The walk is iterative, so nesting depth is not limited by the stack.
pub fn extract_document<D: Document>(doc: &D, scheme: Scheme) -> Vec<Entry> {
    let entries = match scheme {
        Scheme::FullKey => full_key(doc),
        Scheme::HashChain => hash_chain(doc),
    };
    entries.into_iter().collect()
}

fn full_key<D: Document>(doc: &D) -> IndexSet<Entry> {
    let mut entries = IndexSet::new();
    for token in tokens(doc) {
        match token {
            Token::Key(key) => {
                entries.insert(Entry::key(key));
            }
            Token::Value(value) => {
                if let Some(scalar) = Scalar::from_document(value) {
                    entries.insert(Entry::value(&scalar));
                }
            }
            // string array elements are stored as keys
            Token::Elem(elem) => match Scalar::from_document(elem) {
                Some(Scalar::String(s)) => {
                    entries.insert(Entry::key(&s));
                }
                Some(scalar) => {
                    entries.insert(Entry::value(&scalar));
                }
                None => {}
            },
            Token::BeginArray(_) | Token::BeginObject(_) | Token::EndArray | Token::EndObject => {}
        }
    }
    entries
}

/// One hash per scalar. Each open container keeps the hash of the keys
/// leading to it; array levels pass it through unchanged.
fn hash_chain<D: Document>(doc: &D) -> IndexSet<Entry> {
    let mut entries = IndexSet::new();
    let mut stack: Vec<u32> = Vec::new();
    for token in tokens(doc) {
        match token {
            Token::BeginArray(_) | Token::BeginObject(_) => {
                let outer = stack.last().copied().unwrap_or(0);
                stack.push(outer);
            }
            Token::Key(key) => {
                if let Some(hash) = stack.last_mut() {
                    hash_key(key, hash);
                }
            }
            Token::Value(value) | Token::Elem(value) => {
                if let Some(scalar) = Scalar::from_document(value) {
                    let mut hash = stack.last().copied().unwrap_or(0);
                    hash_scalar(&scalar, &mut hash);
                    entries.insert(Entry::PathHash(hash));
                }
                reset_top(&mut stack);
            }
            Token::EndArray | Token::EndObject => {
                stack.pop();
                reset_top(&mut stack);
            }
        }
    }
    entries
}

/// Drop the key folded into the innermost level, ready for the next member.
fn reset_top(stack: &mut [u32]) {
    let Some(top) = stack.len().checked_sub(1) else {
        return;
    };
    stack[top] = if top > 0 { stack[top - 1] } else { 0 };
}
