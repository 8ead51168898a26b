//! In-memory transceiver pair for wiring two PHYs back to back.
//!
//! Each direction is a crossbeam channel carrying one [`TxLane`] per tick.
//! One electrical-idle lane is queued in each direction up front, so what
//! one end transmits on tick `n` is received by the other on tick `n + 1`
//! regardless of which end ticks first.

use crossbeam_channel::{unbounded, Receiver, Sender};
use sataphy_core::{
    lane::{RxLane, TxLane},
    speed::SpeedGrade,
    transceiver::Transceiver,
};

/// One end of a simulated serial link.
#[derive(Debug)]
pub struct SimTransceiver {
    outbound: Sender<TxLane>,
    inbound: Receiver<TxLane>,
    line_rate: SpeedGrade,
    locked: bool,
}

/// Creates two connected transceivers.
pub fn loopback() -> (SimTransceiver, SimTransceiver) {
    let (a_out, b_in) = unbounded();
    let (b_out, a_in) = unbounded();
    for sender in [&a_out, &b_out] {
        // Both receivers are alive, so the send cannot fail.
        let _ = sender.send(TxLane::electrical_idle());
    }
    (SimTransceiver::new(a_out, a_in), SimTransceiver::new(b_out, b_in))
}

impl SimTransceiver {
    fn new(outbound: Sender<TxLane>, inbound: Receiver<TxLane>) -> Self {
        Self { outbound, inbound, line_rate: SpeedGrade::LOWEST, locked: true }
    }

    /// Sets the lock status reported on every following receive.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Returns the reported lock status.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Transceiver for SimTransceiver {
    fn receive(&mut self) -> RxLane {
        let lane = self.inbound.try_recv().unwrap_or_default();
        // A character serialized at another rate cannot be recovered.
        let character = lane.character.filter(|_| lane.rate == Some(self.line_rate));
        RxLane { character, oob: lane.oob, locked: self.locked }
    }

    fn transmit(&mut self, lane: TxLane) {
        if self.outbound.send(lane).is_err() {
            tracing::trace!("Loopback partner gone, lane dropped");
        }
    }

    fn set_line_rate(&mut self, grade: SpeedGrade) {
        tracing::trace!("Line rate {} -> {}", self.line_rate, grade);
        self.line_rate = grade;
    }

    fn line_rate(&self) -> SpeedGrade {
        self.line_rate
    }
}

#[cfg(test)]
mod tests {
    use sataphy_core::lane::{Character, OobBurst, OobSignal};

    use super::*;

    #[test]
    fn test_one_tick_latency() {
        let (mut a, mut b) = loopback();
        let lane = TxLane::character(Character::data(0x5A), SpeedGrade::Gen1);

        a.transmit(lane);
        assert_eq!(b.receive().character, None);
        assert_eq!(b.receive().character, Some(Character::data(0x5A)));
    }

    #[test]
    fn test_rate_mismatch_drops_character_keeps_oob() {
        let (mut a, mut b) = loopback();
        b.receive();
        b.set_line_rate(SpeedGrade::Gen2);

        a.transmit(TxLane::character(Character::data(1), SpeedGrade::Gen3));
        assert_eq!(b.receive().character, None);

        let burst = OobBurst::new(OobSignal::ComWake, SpeedGrade::Gen3);
        a.transmit(TxLane::oob(burst));
        assert_eq!(b.receive().oob, Some(burst));
    }

    #[test]
    fn test_lock_status_is_reported() {
        let (mut a, _b) = loopback();
        assert!(a.receive().locked);
        a.set_locked(false);
        assert!(!a.receive().locked);
    }
}
