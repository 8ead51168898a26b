//! Events published by the composer.
//!
//! Link transitions from the negotiator are forwarded as-is; the composer
//! adds the one event only it can see, a forced domain reset.

use sataphy_core::speed::SpeedGrade;
use sataphy_link::{LinkDownReason, LinkEvent};

/// Events pushed through the PHY event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhyEvent {
    /// The link reached Ready at the grade.
    LinkUp(SpeedGrade),
    /// The link left Ready.
    LinkDown(LinkDownReason),
    /// Training failed and the host stepped down a grade.
    SpeedFallback {
        /// Grade that failed
        from: SpeedGrade,
        /// Grade tried next
        to: SpeedGrade,
    },
    /// OOB retries were exhausted.
    OobLinkDown,
    /// Training failed at every allowed grade; a new negotiation request is needed.
    NegotiationFailed,
    /// The clock/reset generator forced every component back to its initial state.
    DomainReset,
}

impl From<LinkEvent> for PhyEvent {
    fn from(event: LinkEvent) -> Self {
        match event {
            LinkEvent::LinkUp(grade) => PhyEvent::LinkUp(grade),
            LinkEvent::LinkDown(reason) => PhyEvent::LinkDown(reason),
            LinkEvent::SpeedFallback { from, to } => PhyEvent::SpeedFallback { from, to },
            LinkEvent::OobLinkDown => PhyEvent::OobLinkDown,
            LinkEvent::NegotiationFailed => PhyEvent::NegotiationFailed,
        }
    }
}
