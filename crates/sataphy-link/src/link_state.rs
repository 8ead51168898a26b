use std::fmt::{self, Display, Formatter};

use sataphy_core::speed::SpeedGrade;

/// Link establishment state machine.
///
/// Tracks the link from electrical idle through out-of-band detection and
/// speed training to an aligned, ready character stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
    /// Transmitter in electrical idle, waiting for the hold time to elapse
    #[default]
    Reset,

    /// Exchanging COMRESET/COMINIT/COMWAKE bursts with the partner
    DetectOob,

    /// Clocks switched to the grade and training is in progress
    NegotiateSpeed(SpeedGrade),

    /// Trained; exchanging ALIGN/SYNC until the streams are aligned
    AlignWait,

    /// Link up: upstream words flow in both directions
    Ready,
}

impl LinkState {
    /// Returns true if upstream words may flow.
    pub fn is_ready(&self) -> bool {
        matches!(self, LinkState::Ready)
    }

    /// Returns true while a negotiation is in progress.
    pub fn is_negotiating(&self) -> bool {
        matches!(self, LinkState::DetectOob | LinkState::NegotiateSpeed(_) | LinkState::AlignWait)
    }

    /// Returns true while the transmitter is held in electrical idle.
    pub fn is_reset(&self) -> bool {
        matches!(self, LinkState::Reset)
    }
}

impl Display for LinkState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Reset => write!(fmt, "Reset"),
            LinkState::DetectOob => write!(fmt, "DetectOob"),
            LinkState::NegotiateSpeed(grade) => write!(fmt, "NegotiateSpeed({})", grade),
            LinkState::AlignWait => write!(fmt, "AlignWait"),
            LinkState::Ready => write!(fmt, "Ready"),
        }
    }
}
