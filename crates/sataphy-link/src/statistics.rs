//! Link statistics tracking.
//!
//! Counters for every fault the negotiator retries internally, so that
//! upper layers can observe link quality without seeing individual errors.

/// Cumulative link counters since power-on or the last [`reset`](LinkStatistics::reset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatistics {
    /// OOB response waits that timed out
    pub oob_timeouts: u64,
    /// Times the OOB retry budget was exhausted and link-down was raised
    pub oob_link_downs: u64,
    /// Training attempts that failed (timeout, or an unsupported proposal on the device)
    pub training_failures: u64,
    /// Speed grade step-downs
    pub speed_fallbacks: u64,
    /// Unexpected characters while aligning or ready
    pub framing_errors: u64,
    /// Times the link reached Ready
    pub link_ups: u64,
    /// Times the link left Ready
    pub link_losses: u64,
    /// Received data characters dropped because upstream withheld acknowledgment
    pub overruns: u64,
}

impl LinkStatistics {
    /// Total number of faults of any kind.
    pub fn total_errors(&self) -> u64 {
        self.oob_timeouts + self.training_failures + self.framing_errors + self.overruns
    }

    /// Resets all statistics counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
