//! Lane interception for custom processing.
//!
//! This module provides a trait for intercepting transceiver lanes as they
//! cross the transceiver boundary. Useful for fault injection (loss of lock,
//! corrupted characters), tracing and line inspection.

use crate::lane::{RxLane, TxLane};

/// Trait for intercepting lanes before/after the line.
///
/// Interceptors can inspect, modify, or blank lanes at the transceiver boundary.
///
/// # Examples
/// ```
/// use sataphy_core::{interceptor::LaneInterceptor, lane::{RxLane, TxLane}};
///
/// struct LockDropper {
///     ticks: u64,
/// }
///
/// impl LaneInterceptor for LockDropper {
///     fn on_receive(&mut self, lane: &mut RxLane) -> bool {
///         self.ticks += 1;
///         if self.ticks > 100 {
///             lane.locked = false;
///         }
///         true
///     }
///
///     fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
///         true
///     }
/// }
/// ```
pub trait LaneInterceptor: Send {
    /// Called when a lane has been recovered, before the link core sees it.
    ///
    /// # Returns
    /// * `true` - Deliver the (possibly modified) lane
    /// * `false` - Blank the lane: no character and no OOB burst are delivered
    fn on_receive(&mut self, lane: &mut RxLane) -> bool;

    /// Called when a lane is about to be driven onto the line.
    ///
    /// # Returns
    /// * `true` - Drive the (possibly modified) lane
    /// * `false` - Drive electrical idle instead
    fn on_transmit(&mut self, lane: &mut TxLane) -> bool;
}

/// No-op interceptor that passes all lanes through unchanged.
///
/// This is the default interceptor when none is specified.
#[derive(Debug, Clone, Copy)]
pub struct NoOpInterceptor;

impl LaneInterceptor for NoOpInterceptor {
    fn on_receive(&mut self, _lane: &mut RxLane) -> bool {
        true
    }

    fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lane::Character, speed::SpeedGrade};

    struct CountingInterceptor {
        received: usize,
        sent: usize,
    }

    impl LaneInterceptor for CountingInterceptor {
        fn on_receive(&mut self, _lane: &mut RxLane) -> bool {
            self.received += 1;
            true
        }

        fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
            self.sent += 1;
            true
        }
    }

    #[test]
    fn test_counting_interceptor() {
        let mut interceptor = CountingInterceptor { received: 0, sent: 0 };

        let mut rx = RxLane::idle(true);
        assert!(interceptor.on_receive(&mut rx));
        assert_eq!(interceptor.received, 1);

        let mut tx = TxLane::electrical_idle();
        assert!(interceptor.on_transmit(&mut tx));
        assert_eq!(interceptor.sent, 1);
    }

    struct CorruptingInterceptor;

    impl LaneInterceptor for CorruptingInterceptor {
        fn on_receive(&mut self, lane: &mut RxLane) -> bool {
            // Turn every data character into an undefined control character
            if let Some(c) = lane.character.as_mut() {
                c.control = true;
            }
            true
        }

        fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
            false
        }
    }

    #[test]
    fn test_corrupting_interceptor() {
        let mut interceptor = CorruptingInterceptor;

        let mut rx = RxLane { character: Some(Character::data(0x12)), oob: None, locked: true };
        assert!(interceptor.on_receive(&mut rx));
        assert_eq!(rx.character, Some(Character::control(0x12)));

        let mut tx = TxLane::character(Character::data(0x12), SpeedGrade::Gen1);
        assert!(!interceptor.on_transmit(&mut tx));
    }

    #[test]
    fn test_noop_interceptor() {
        let mut interceptor = NoOpInterceptor;

        let mut rx = RxLane { character: Some(Character::data(7)), oob: None, locked: true };
        let original = rx;
        assert!(interceptor.on_receive(&mut rx));
        assert_eq!(rx, original);

        let mut tx = TxLane::character(Character::data(7), SpeedGrade::Gen3);
        let original = tx;
        assert!(interceptor.on_transmit(&mut tx));
        assert_eq!(tx, original);
    }
}
