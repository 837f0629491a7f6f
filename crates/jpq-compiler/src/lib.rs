#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! jpq compiler: parse trees in, compiled queries out.
//!
//! - `parse_tree` - the tree an external parser hands over ([`ParseNode`])
//! - `builder` - shorthand constructors for parse trees
//! - `encoder` - [`encode`], variable splicing ([`bind`]) and the [`Encoder`] builder
//! - `decompile` - [`to_parse_tree`], the inverse of encoding

pub mod builder;
mod decompile;
mod encoder;
mod parse_tree;

#[cfg(test)]
mod encoder_tests;
#[cfg(test)]
mod parse_tree_tests;

pub use decompile::to_parse_tree;
pub use encoder::{Encoder, bind, encode};
pub use parse_tree::{Member, ParseNode, PathItem, Subscript};

use jpq_bytecode::DecodeError;

/// Errors raised while encoding a parse tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("`@` used outside of a filter or lambda")]
    CurrentOutsideFilter,

    #[error("`@{level}` does not name an enclosing filter or lambda (innermost is {innermost})")]
    InvalidLevel { level: u32, innermost: u32 },

    #[error("`last` used outside of an array subscript")]
    LastOutsideSubscript,

    #[error("lambda used outside of a higher-order function")]
    LambdaOutsideCall,

    #[error("{function}() expects a lambda argument")]
    LambdaExpected { function: &'static str },

    #[error("lambda declares {0} parameters (at most 3)")]
    TooManyParams(usize),

    #[error("invalid like_regex pattern {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Recursion limit exceeded (parse tree nested too deeply).
    #[error("recursion limit of {0} exceeded")]
    DepthLimitExceeded(u32),

    #[error("compiled query exceeds the addressable size")]
    TooLarge,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type for encoding.
pub type Result<T> = std::result::Result<T, EncodeError>;
