//! Per-call retry bookkeeping.
//!
//! A call may be retried at most once for an expired session and at most
//! once through the POST verb override. Each allowance is spent the first
//! time it is used; a second failure of the same kind is surfaced.

/// Why a call is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Session expired; credentials were refreshed.
    SessionExpired,
    /// Host refused the verb; resending as POST with an override.
    MethodOverride,
}

/// Retry allowances for one call.
#[derive(Debug, Clone, Default)]
pub struct RetryBudget {
    attempt: u32,
    override_step: u32,
}

impl RetryBudget {
    /// A fresh budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session retries used so far (0 or 1).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Override step in use (0 = native verb, 1 = POST + override).
    pub fn override_step(&self) -> u32 {
        self.override_step
    }

    /// Whether the current attempt uses the verb override.
    pub fn uses_override(&self) -> bool {
        self.override_step > 0
    }

    /// Spend the allowance for `reason`. Returns false if it was already used.
    pub fn try_spend(&mut self, reason: RetryReason) -> bool {
        let slot = match reason {
            RetryReason::SessionExpired => &mut self.attempt,
            RetryReason::MethodOverride => &mut self.override_step,
        };
        if *slot > 0 {
            return false;
        }
        *slot = 1;
        true
    }
}
