//! Clock/reset generator model with a fixed retune time.

use sataphy_core::{
    clock::{ClockReset, ClockStatus},
    speed::SpeedGrade,
};

/// Clock/reset generator that needs `settle_ticks` to lock at a new grade.
///
/// A request for the grade already running is a no-op. A domain reset can be
/// forced with [`force_reset`](SimClockReset::force_reset); it is reported on
/// the next tick only.
#[derive(Debug, Clone)]
pub struct SimClockReset {
    grade: SpeedGrade,
    ready: bool,
    settle_ticks: u32,
    remaining: u32,
    requested: Option<SpeedGrade>,
    reset_pending: bool,
}

impl SimClockReset {
    /// Creates a generator already locked at `grade`.
    pub fn new(grade: SpeedGrade, settle_ticks: u32) -> Self {
        Self {
            grade,
            ready: true,
            settle_ticks,
            remaining: 0,
            requested: None,
            reset_pending: false,
        }
    }

    /// Asserts a domain reset on the next tick.
    pub fn force_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Returns true if the clocks are stable.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Grade the clocks run (or are retuning) at.
    pub fn grade(&self) -> SpeedGrade {
        self.grade
    }
}

impl ClockReset for SimClockReset {
    fn request_speed(&mut self, grade: SpeedGrade) {
        self.requested = Some(grade);
    }

    fn tick(&mut self) -> ClockStatus {
        if let Some(grade) = self.requested.take() {
            if grade != self.grade || !self.ready {
                tracing::debug!("Retuning clocks {} -> {}", self.grade, grade);
                self.grade = grade;
                self.ready = false;
                self.remaining = self.settle_ticks;
            }
        }
        if !self.ready {
            if self.remaining == 0 {
                self.ready = true;
            } else {
                self.remaining -= 1;
            }
        }
        ClockStatus {
            ready: self.ready,
            grade: self.grade,
            reset: std::mem::take(&mut self.reset_pending),
        }
    }
}
