//! Recursion guard shared by the encoder, the evaluator and the index extractor.

/// Returned by [`DepthGuard::enter`] when nesting passes the configured limit,
/// or when the stack budget runs out first (`limit` is then the depth reached).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("recursion depth limit of {limit} exceeded")]
pub struct DepthExceeded {
    pub limit: u32,
}

/// Counts nested recursive calls and fails once `limit` is passed.
///
/// Every recursive entry point calls [`enter`](Self::enter) first and
/// [`leave`](Self::leave) on the way out, including the error path.
///
/// The count alone does not bound stack use: one level may span several
/// native frames, and frames are much larger in unoptimized builds. The
/// guard therefore also measures how far the stack has grown since the
/// outermost `enter` and fails once that passes the stack budget.
#[derive(Clone, Copy, Debug)]
pub struct DepthGuard {
    depth: u32,
    limit: u32,
    stack_budget: usize,
    /// Stack position of the outermost `enter`, while `depth > 0`.
    base: Option<usize>,
}

impl DepthGuard {
    pub const DEFAULT_LIMIT: u32 = 1024;

    /// Stack bytes the guarded recursion may use. Fits a default 2 MiB
    /// spawned thread with room left for the caller and the last level.
    pub const DEFAULT_STACK_BUDGET: usize = 1024 * 1024;

    pub fn new(limit: u32) -> Self {
        Self {
            depth: 0,
            limit,
            stack_budget: Self::DEFAULT_STACK_BUDGET,
            base: None,
        }
    }

    pub fn with_stack_budget(mut self, bytes: usize) -> Self {
        self.stack_budget = bytes;
        self
    }

    pub fn enter(&mut self) -> Result<(), DepthExceeded> {
        if self.depth >= self.limit {
            return Err(DepthExceeded { limit: self.limit });
        }
        let here = stack_position();
        let base = *self.base.get_or_insert(here);
        if base.abs_diff(here) > self.stack_budget {
            return Err(DepthExceeded { limit: self.depth });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced depth guard");
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.base = None;
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Default for DepthGuard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

/// Address of a local in the current frame.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}
