use sataphy_core::{error::LinkError, speed::SpeedGrade};

use crate::{link_state::LinkState, statistics::LinkStatistics};

/// Read-only snapshot of the link for upper layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    /// Current link state
    pub state: LinkState,
    /// Current (or last negotiated) speed grade
    pub grade: SpeedGrade,
    /// Upstream words may flow
    pub ready: bool,
    /// OOB retries were exhausted since the link was last up
    pub link_down: bool,
    /// Last fault surfaced after retries ran out, cleared on link-up or a new request
    pub failure: Option<LinkError>,
    /// Set after speed training failed at every allowed grade; cleared by a new request
    pub halted: bool,
    /// Cumulative counters
    pub statistics: LinkStatistics,
}
