//! Errors that can occur during evaluation.

use std::fmt;

use jpq_bytecode::DecodeError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The compiled query is corrupt.
    #[error(transparent)]
    Malformed(#[from] DecodeError),

    /// Operand shape does not fit the operator or item method.
    #[error("{0}")]
    TypeMismatch(String),

    /// A construct that needs exactly one item got zero or several.
    #[error("{0}")]
    SingletonRequired(String),

    /// Higher-order call with the wrong number of lambda parameters, seeds or arguments.
    #[error("{function}(): expected {expected} {what}, got {actual}")]
    ArgumentCountMismatch {
        function: &'static str,
        what: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// A boolean result was required but the expression did not produce one.
    #[error("{0}")]
    ComparisonUndefined(String),

    /// Missing key, subscript out of bounds, accessor applied to the wrong container.
    #[error("{0}")]
    Structural(String),

    /// Division by zero or a number that cannot be represented.
    #[error("{0}")]
    Arithmetic(String),

    #[error("could not find jsonpath variable \"{0}\"")]
    UndefinedVariable(String),

    /// Unknown operator or cast, or the external function failed.
    #[error("{0}")]
    Unresolved(String),

    #[error("recursion depth limit of {0} exceeded")]
    DepthLimitExceeded(u32),

    #[error("execution limit of {0} steps exceeded")]
    ExecFuelExhausted(u32),
}

/// Error category, used to decide what lenient evaluation swallows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedBuffer,
    TypeMismatch,
    SingletonRequired,
    ArgumentCountMismatch,
    ComparisonUndefined,
    Structural,
    Arithmetic,
    UndefinedVariable,
    Unresolved,
    DepthLimitExceeded,
    ExecFuelExhausted,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedBuffer => "malformed buffer",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::SingletonRequired => "singleton required",
            ErrorKind::ArgumentCountMismatch => "argument count mismatch",
            ErrorKind::ComparisonUndefined => "comparison undefined",
            ErrorKind::Structural => "structural error",
            ErrorKind::Arithmetic => "arithmetic error",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::Unresolved => "unresolved function",
            ErrorKind::DepthLimitExceeded => "depth limit exceeded",
            ErrorKind::ExecFuelExhausted => "execution fuel exhausted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Malformed(_) => ErrorKind::MalformedBuffer,
            EvalError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            EvalError::SingletonRequired(_) => ErrorKind::SingletonRequired,
            EvalError::ArgumentCountMismatch { .. } => ErrorKind::ArgumentCountMismatch,
            EvalError::ComparisonUndefined(_) => ErrorKind::ComparisonUndefined,
            EvalError::Structural(_) => ErrorKind::Structural,
            EvalError::Arithmetic(_) => ErrorKind::Arithmetic,
            EvalError::UndefinedVariable(_) => ErrorKind::UndefinedVariable,
            EvalError::Unresolved(_) => ErrorKind::Unresolved,
            EvalError::DepthLimitExceeded(_) => ErrorKind::DepthLimitExceeded,
            EvalError::ExecFuelExhausted(_) => ErrorKind::ExecFuelExhausted,
        }
    }

    /// Data-shape errors: predicates turn them into `Unknown` and lenient
    /// evaluation into "no result". Everything else always propagates.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TypeMismatch
                | ErrorKind::SingletonRequired
                | ErrorKind::ComparisonUndefined
                | ErrorKind::Structural
                | ErrorKind::Arithmetic
        )
    }
}
