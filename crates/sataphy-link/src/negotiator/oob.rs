//! Out-of-band handshake.
//!
//! The host initiates every burst and carries the speed proposal on its
//! COMWAKE; the device only responds. Both run the same stepper over a
//! role-selected sequence.

use sataphy_core::{
    config::Role,
    error::LinkError,
    lane::{OobBurst, OobSignal},
};

use super::{LinkDownReason, LinkEvent, LinkInput, LinkOutput, Negotiator, Phase, TxDirective};

/// One step of an OOB sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OobStep {
    /// Transmit the burst for one tick
    Send(OobSignal),
    /// Wait for the burst, bounded by the OOB timeout
    Await(OobSignal),
    /// Wait for the burst indefinitely
    Listen(OobSignal),
}

const HOST_SEQUENCE: [OobStep; 4] = [
    OobStep::Send(OobSignal::ComReset),
    OobStep::Await(OobSignal::ComInit),
    OobStep::Send(OobSignal::ComWake),
    OobStep::Await(OobSignal::ComWake),
];

const DEVICE_SEQUENCE: [OobStep; 4] = [
    OobStep::Listen(OobSignal::ComReset),
    OobStep::Send(OobSignal::ComInit),
    OobStep::Await(OobSignal::ComWake),
    OobStep::Send(OobSignal::ComWake),
];

/// Device step following the passive COMRESET listen.
pub(super) const DEVICE_RESTART_STEP: usize = 1;

/// Burst sequence for a role; completing it starts speed negotiation.
pub(crate) fn sequence(role: Role) -> &'static [OobStep] {
    match role {
        Role::Host => &HOST_SEQUENCE,
        Role::Device => &DEVICE_SEQUENCE,
    }
}

impl Negotiator {
    pub(super) fn tick_detect_oob(&mut self, step: usize, input: &LinkInput, out: &mut LinkOutput) {
        let sequence = sequence(self.config.role);
        let Some(&current) = sequence.get(step) else {
            self.finish_oob(out);
            return;
        };

        match current {
            OobStep::Send(signal) => {
                out.tx = TxDirective::Oob(OobBurst::new(signal, self.grade));
                tracing::trace!("Sent {:?} at {}", signal, self.grade);
                self.advance_oob(step + 1, out);
            }
            OobStep::Await(signal) | OobStep::Listen(signal) => match input.oob {
                Some(burst) if burst.signal == signal => {
                    if signal == OobSignal::ComWake {
                        self.proposal = Some(burst.grade);
                    }
                    self.advance_oob(step + 1, out);
                }
                _ if matches!(current, OobStep::Await(_)) => {
                    self.timer += 1;
                    if self.timer >= self.oob_timeout_ticks {
                        self.on_oob_timeout(signal, out);
                    }
                }
                _ => {}
            },
        }
    }

    fn advance_oob(&mut self, next: usize, out: &mut LinkOutput) {
        if next < sequence(self.config.role).len() {
            self.phase = Phase::DetectOob(next);
            self.timer = 0;
        } else {
            self.finish_oob(out);
        }
    }

    fn finish_oob(&mut self, out: &mut LinkOutput) {
        self.oob_retries = 0;
        let grade = self.training_grade();
        self.enter_negotiate_speed(grade, out);
    }

    fn on_oob_timeout(&mut self, signal: OobSignal, out: &mut LinkOutput) {
        self.statistics.oob_timeouts += 1;
        self.oob_retries = self.oob_retries.saturating_add(1);

        if self.oob_retries > self.config.max_oob_retries {
            tracing::error!(
                "No {:?} from link partner after {} attempt(s), reporting link down",
                signal,
                self.oob_retries
            );
            self.oob_retries = 0;
            self.link_down = true;
            self.failure = Some(LinkError::OobTimeout);
            self.statistics.oob_link_downs += 1;
            out.event = Some(LinkEvent::OobLinkDown);
            self.enter(Phase::Reset);
        } else {
            tracing::warn!(
                "Timed out waiting for {:?} (retry {}/{})",
                signal,
                self.oob_retries,
                self.config.max_oob_retries
            );
            self.phase = Phase::DetectOob(0);
            self.timer = 0;
        }
    }

    /// Device: a COMRESET outside the passive listen restarts the handshake.
    ///
    /// In Reset the COMRESET is only latched; the hold still has to elapse
    /// under lock and clock-ready before COMINIT goes out.
    pub(super) fn restart_on_comreset(&mut self, input: &LinkInput, out: &mut LinkOutput) -> bool {
        if self.config.role != Role::Device
            || !input.oob.is_some_and(|b| b.signal == OobSignal::ComReset)
            || self.phase == Phase::DetectOob(0)
        {
            return false;
        }
        if self.phase == Phase::Reset {
            if input.locked && !self.halted {
                tracing::trace!("COMRESET during reset hold, answering once it elapses");
                self.pending_comreset = true;
            }
            return false;
        }

        tracing::debug!("COMRESET from host in {}, restarting OOB handshake", self.state());
        if self.phase == Phase::Ready {
            self.link_lost(LinkDownReason::PartnerReset, out);
        }
        self.start_session();
        self.enter(Phase::DetectOob(DEVICE_RESTART_STEP));
        true
    }
}
