use jpq_bytecode::DecodeError;
use jpq_core::DepthExceeded;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// Nothing indexable was found; the caller has to scan every document.
    #[error("query cannot be answered from the index: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Malformed(#[from] DecodeError),

    #[error("recursion depth limit of {0} exceeded")]
    DepthLimitExceeded(u32),
}

impl From<DepthExceeded> for ExtractError {
    fn from(err: DepthExceeded) -> Self {
        ExtractError::DepthLimitExceeded(err.limit)
    }
}
