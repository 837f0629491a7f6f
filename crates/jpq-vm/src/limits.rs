use jpq_core::DepthGuard;

/// Runtime limits for evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum node steps and `.**` iterations (default: 1,000,000).
    pub(crate) exec_fuel: u32,
    /// Maximum nesting of node evaluation and lambda calls (default: 1,024).
    pub(crate) recursion_limit: u32,
    /// Stack bytes nested evaluation may use (default: 1 MiB).
    pub(crate) stack_budget: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            exec_fuel: 1_000_000,
            recursion_limit: DepthGuard::DEFAULT_LIMIT,
            stack_budget: DepthGuard::DEFAULT_STACK_BUDGET,
        }
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Lower this when evaluating on a thread with less than 2 MiB of stack.
    pub fn stack_budget(mut self, bytes: usize) -> Self {
        self.stack_budget = bytes;
        self
    }

    pub fn get_exec_fuel(&self) -> u32 {
        self.exec_fuel
    }

    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    pub fn get_stack_budget(&self) -> usize {
        self.stack_budget
    }
}
