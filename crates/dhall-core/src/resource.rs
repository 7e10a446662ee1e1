//! Step budgets for evaluation and type inference.
//!
//! Dhall is normalizing, so every well-typed input terminates — but
//! syntactically valid, ill-typed input can still recurse deeply. Embedders
//! that feed the engine untrusted expressions should set a step limit; the
//! limit bounds the combined work of beta-evaluation and type inference for
//! one top-level operation.

use std::fmt;

/// Limits applied to one engine operation.
///
/// `None` means unlimited, which is the default: a trusted, well-typed
/// configuration always terminates on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of evaluator/inferencer node visits.
    pub max_steps: Option<u64>,
}

impl ResourceLimits {
    pub const UNLIMITED: Self = Self { max_steps: None };

    pub fn steps(max_steps: u64) -> Self {
        Self {
            max_steps: Some(max_steps),
        }
    }
}

/// Error returned when the step budget is exhausted. Fatal: the operation
/// that hit it is abandoned, not resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetError {
    /// The limit that was exceeded.
    pub limit: u64,
}

impl fmt::Display for BudgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step budget exceeded: limit {}", self.limit)
    }
}

impl std::error::Error for BudgetError {}

/// Result alias for operations that can only fail by running out of fuel.
pub type EvalResult<T> = Result<T, BudgetError>;

/// Counts node visits against a limit. One counter is shared by evaluation
/// and inference within a single engine operation.
#[derive(Debug)]
pub(crate) struct StepCounter {
    limit: Option<u64>,
    used: u64,
}

impl StepCounter {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limit: limits.max_steps,
            used: 0,
        }
    }

    /// Charges one step.
    pub fn tick(&mut self) -> EvalResult<()> {
        self.used += 1;
        match self.limit {
            Some(limit) if self.used > limit => Err(BudgetError { limit }),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub fn used(&self) -> u64 {
        self.used
    }
}
