#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Inverted-index support for compiled path queries.
//!
//! A document is reduced to a set of [`Entry`] values ([`extract_document`]);
//! a query is reduced to the entries it needs plus a boolean formula over
//! them ([`extract_query`]). The formula is evaluated against the entries a
//! candidate document holds ([`consistent`], [`tri_consistent`]). A positive
//! answer only means "could match": the query still has to be rechecked
//! against the document.

mod consistency;
mod document;
mod entry;
mod error;
mod query;

#[cfg(test)]
mod document_tests;

pub use consistency::{Ternary, consistent, tri_consistent};
pub use document::extract_document;
pub use entry::{BoolTree, Entry, MAX_TEXT_LEN, Scheme, Strategy, Text};
pub use error::ExtractError;
pub use query::{IndexQuery, QueryExtractor, extract_query};

pub type Result<T> = std::result::Result<T, ExtractError>;
