#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Shared building blocks for jpq.
//!
//! - Scalars: [`Numeric`], [`Datetime`], [`Scalar`] and their stable hashing
//! - Documents: the [`Document`] trait, its `serde_json::Value` implementation
//!   and the non-recursive [`tokens`] walker
//! - Evaluation glue: [`Mode`], [`Variables`], [`DepthGuard`], [`Colors`]

mod colors;
mod datetime;
mod document;
mod limits;
mod numeric;
mod scalar;

#[cfg(test)]
mod document_tests;
#[cfg(test)]
mod numeric_tests;
#[cfg(test)]
mod scalar_tests;

pub use colors::Colors;
pub use datetime::Datetime;
pub use document::{DocKind, Document, Token, Tokens, Variables, tokens};
pub use limits::{DepthExceeded, DepthGuard};
pub use numeric::{Numeric, NumericError};
pub use scalar::{Scalar, hash_key, hash_scalar, hash_text};

/// Evaluation dialect of a compiled query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Arrays are unwrapped and scalars wrapped on demand; structural errors are ignored.
    #[default]
    Lax,
    /// Shape mismatches are reported as errors.
    Strict,
}

impl Mode {
    pub fn is_lax(self) -> bool {
        self == Mode::Lax
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Lax => "lax",
            Mode::Strict => "strict",
        }
    }
}
