//! Consecutive-failure counter.
//!
//! Both nodes keep their own counter and drive it from the same verdicts,
//! so the two stay equal after every completed exchange. Nothing on the link
//! cross-checks them: if one node resets or misses a verdict, the counters
//! diverge silently.

use doorlock_proto::Verdict;

/// What a recorded verdict means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Verdict was a match; the counter is back to zero.
    Cleared,
    /// Mismatch below the threshold; the user may try again.
    Retry {
        /// Consecutive failures so far (1..threshold).
        failures: u8,
    },
    /// Mismatch that reached the threshold; a lockout must follow.
    Exhausted,
}

/// Counts consecutive verification mismatches.
///
/// The value stays in `0..threshold` except between [`FailureOutcome::Exhausted`]
/// and the following [`FailureCounter::engage_lockout`], where it equals the
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureCounter {
    failures: u8,
    threshold: u8,
}

impl FailureCounter {
    /// Empty counter that reports exhaustion at `threshold` failures.
    pub const fn new(threshold: u8) -> Self {
        Self { failures: 0, threshold }
    }

    /// Consecutive failures recorded.
    pub const fn failures(&self) -> u8 {
        self.failures
    }

    /// True once the threshold is reached and no lockout has been engaged.
    pub const fn is_exhausted(&self) -> bool {
        self.failures >= self.threshold
    }

    /// Apply a verdict.
    pub fn record(&mut self, verdict: Verdict) -> FailureOutcome {
        match verdict {
            Verdict::Matched => {
                self.failures = 0;
                FailureOutcome::Cleared
            },
            Verdict::Unmatched => {
                self.failures = self.failures.saturating_add(1);
                if self.is_exhausted() {
                    FailureOutcome::Exhausted
                } else {
                    FailureOutcome::Retry { failures: self.failures }
                }
            },
        }
    }

    /// Reset to zero after a match that did not go through [`Self::record`].
    pub fn clear(&mut self) {
        self.failures = 0;
    }

    /// Reset on lockout entry. Returns whether a lockout was actually due;
    /// below the threshold the counter is left untouched.
    pub fn engage_lockout(&mut self) -> bool {
        if !self.is_exhausted() {
            return false;
        }
        self.failures = 0;
        true
    }
}
