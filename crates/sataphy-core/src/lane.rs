//! Per-tick transceiver lanes.
//!
//! A lane is everything that crosses the transceiver boundary in one tick in
//! one direction: at most one character, an optional OOB burst, and (on RX)
//! the transceiver's lock status. A TX lane without a character is electrical
//! idle.

use crate::speed::SpeedGrade;

/// One transceiver-granularity unit: an 8-bit value plus a control flag.
///
/// The control flag marks a primitive (K) character rather than data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Character {
    /// Payload value
    pub value: u8,
    /// True for control (primitive) characters
    pub control: bool,
}

impl Character {
    /// Creates a data character.
    pub const fn data(value: u8) -> Self {
        Self { value, control: false }
    }

    /// Creates a control character.
    pub const fn control(value: u8) -> Self {
        Self { value, control: true }
    }
}

/// Out-of-band burst kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OobSignal {
    /// Host-initiated reset burst
    ComReset,
    /// Device-initiated initialization burst
    ComInit,
    /// Wake burst, sent by both sides in turn
    ComWake,
}

/// An OOB burst and the speed grade its sender is configured for.
///
/// The grade on the host's COMWAKE is the speed proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OobBurst {
    /// Burst kind
    pub signal: OobSignal,
    /// Sender's speed grade
    pub grade: SpeedGrade,
}

impl OobBurst {
    /// Creates a burst.
    pub const fn new(signal: OobSignal, grade: SpeedGrade) -> Self {
        Self { signal, grade }
    }
}

/// What the transmitter drives during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxLane {
    /// Character on the line, `None` for electrical idle
    pub character: Option<Character>,
    /// OOB burst, if one is sent this tick
    pub oob: Option<OobBurst>,
    /// Line rate the character was serialized at
    pub rate: Option<SpeedGrade>,
}

impl TxLane {
    /// Electrical idle: nothing on the line.
    pub fn electrical_idle() -> Self {
        Self::default()
    }

    /// A character serialized at `rate`.
    pub fn character(character: Character, rate: SpeedGrade) -> Self {
        Self { character: Some(character), oob: None, rate: Some(rate) }
    }

    /// An OOB burst; the line is otherwise idle.
    pub fn oob(burst: OobBurst) -> Self {
        Self { character: None, oob: Some(burst), rate: None }
    }

    /// Returns true when no character is driven.
    pub fn is_electrical_idle(&self) -> bool {
        self.character.is_none()
    }
}

/// What the receiver recovered during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxLane {
    /// Recovered character, `None` if nothing could be decoded
    pub character: Option<Character>,
    /// Detected OOB burst
    pub oob: Option<OobBurst>,
    /// Transceiver lock/ready status
    pub locked: bool,
}

impl RxLane {
    /// Nothing recovered this tick.
    pub fn idle(locked: bool) -> Self {
        Self { character: None, oob: None, locked }
    }
}
