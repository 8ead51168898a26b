//! Transceiver abstraction for pluggable serializer/deserializer models.

use crate::{
    lane::{RxLane, TxLane},
    speed::SpeedGrade,
};

/// Character-stream Sink/Source pair exposed by the transceiver.
///
/// The link core calls `receive` then `transmit` exactly once per tick. This
/// trait lets hardware models, loopback channels or recorded traces be
/// plugged into the composer without coupling to a concrete implementation.
pub trait Transceiver {
    /// Returns what was recovered from the line this tick, including lock status.
    fn receive(&mut self) -> RxLane;

    /// Drives the line for this tick.
    fn transmit(&mut self, lane: TxLane);

    /// Retunes the serializer/deserializer to a new line rate.
    fn set_line_rate(&mut self, grade: SpeedGrade);

    /// Returns the current line rate.
    fn line_rate(&self) -> SpeedGrade;
}
