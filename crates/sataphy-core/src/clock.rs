//! Clock/reset generator abstraction.

use crate::speed::SpeedGrade;

/// Status reported by the clock/reset generator for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStatus {
    /// Clocks are stable at `grade`
    pub ready: bool,
    /// Grade the clocks are (or will be, once ready) running at
    pub grade: SpeedGrade,
    /// Domain-wide reset asserted this tick
    pub reset: bool,
}

/// Abstraction over the clock/reset generator.
///
/// A speed change is a handshake: the link core requests a grade, the
/// generator drops `ready` while it retunes and raises it again at the new
/// grade. The status returned by the next `tick` already reflects a request.
/// Independently, the generator may assert `reset` on any tick, after which
/// every component must be back in its initial state.
pub trait ClockReset {
    /// Requests clocks for `grade`.
    fn request_speed(&mut self, grade: SpeedGrade);

    /// Advances one tick and returns the status for it.
    fn tick(&mut self) -> ClockStatus;
}
