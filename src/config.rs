/// How the loader treats a labeled line it cannot read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Refuse to build the program and report the line.
    #[default]
    Strict,
    /// Drop the line, log it and keep it in the loader's warnings.
    Lenient,
}

/// What to do with an operation that is neither a primitive nor a loaded macro.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnknownOperationPolicy {
    /// The running (sub)program halts, as if it had no successor.
    #[default]
    Halt,
    Fail,
}

#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    /// Stop after this many executed instructions. `None` lets divergent programs run forever.
    pub max_steps: Option<u64>,
    /// Maximum macro nesting. `None` is limited only by memory.
    pub max_depth: Option<usize>,
    pub unknown_operation: UnknownOperationPolicy,
}

impl RunConfig {
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_unknown_operation(mut self, policy: UnknownOperationPolicy) -> Self {
        self.unknown_operation = policy;
        self
    }
}
