//! Speed training and alignment.
//!
//! After the OOB handshake the negotiator switches clocks to the session
//! grade, trains, then exchanges primitives until both character streams are
//! aligned. The host steps the grade down on each training failure within a
//! session; the device trains at the lower of the proposal and its maximum.

use sataphy_core::{config::Role, error::LinkError, speed::SpeedGrade};
use sataphy_protocol::{encode, CharClass, Primitive, PrimitiveEncoder};

use super::{LinkEvent, LinkInput, LinkOutput, Negotiator, Phase, TxDirective};

impl Negotiator {
    /// Grade to train at once the OOB handshake completes.
    pub(super) fn training_grade(&mut self) -> SpeedGrade {
        match self.config.role {
            Role::Host => self.grade,
            Role::Device => {
                let max = self.config.default_speed;
                match self.proposal {
                    Some(proposal) if proposal <= max => proposal,
                    Some(proposal) => {
                        self.statistics.training_failures += 1;
                        tracing::warn!(
                            "Host proposed {} above device maximum {}, training at {}",
                            proposal,
                            max,
                            max
                        );
                        max
                    }
                    None => max,
                }
            }
        }
    }

    pub(super) fn enter_negotiate_speed(&mut self, grade: SpeedGrade, out: &mut LinkOutput) {
        self.grade = grade;
        out.speed_request = Some(grade);
        tracing::debug!("Requesting clocks for {}", grade);
        self.enter(Phase::NegotiateSpeed { grade, clocked: false });
    }

    pub(super) fn tick_negotiate_speed(
        &mut self,
        grade: SpeedGrade,
        clocked: bool,
        input: &LinkInput,
        out: &mut LinkOutput,
    ) {
        let clocked = clocked || (input.crg_ready && input.line_rate == grade);
        if clocked {
            self.phase = Phase::NegotiateSpeed { grade, clocked };
            out.tx = match self.config.role {
                Role::Host => TxDirective::Pattern(PrimitiveEncoder::dial_tone()),
                Role::Device => TxDirective::Pattern(encode(Primitive::Align)),
            };
            if input.rx == Some(CharClass::Align) {
                self.align.reset();
                self.align_errors = 0;
                self.enter(Phase::AlignWait);
                if self.config.role == Role::Device {
                    self.align.record_valid();
                }
                return;
            }
        }

        self.timer += 1;
        if self.timer >= self.training_timeout_ticks {
            self.on_training_failure(grade, out);
        }
    }

    fn on_training_failure(&mut self, grade: SpeedGrade, out: &mut LinkOutput) {
        self.statistics.training_failures += 1;

        if self.config.role == Role::Device {
            tracing::warn!("Training at {} timed out, waiting for COMRESET", grade);
            self.enter(Phase::DetectOob(0));
            return;
        }

        match grade.lower() {
            Some(lower) if self.fallbacks < self.config.max_training_retries => {
                self.fallbacks += 1;
                self.statistics.speed_fallbacks += 1;
                tracing::warn!("Training at {} failed, falling back to {}", grade, lower);
                self.grade = lower;
                out.event = Some(LinkEvent::SpeedFallback { from: grade, to: lower });
                self.enter(Phase::DetectOob(0));
            }
            _ => {
                tracing::error!(
                    "Speed negotiation failed at {} after {} fallback(s), halting until a new request",
                    grade,
                    self.fallbacks
                );
                self.halted = true;
                self.failure = Some(LinkError::TrainingFailure);
                out.event = Some(LinkEvent::NegotiationFailed);
                self.enter(Phase::Reset);
            }
        }
    }

    pub(super) fn tick_align_wait(&mut self, input: &LinkInput, out: &mut LinkOutput) {
        out.tx = TxDirective::Pattern(encode(Primitive::Align));

        match input.rx {
            Some(class) if self.counts_toward_alignment(class) => {
                self.timer = 0;
                if self.align.record_valid() {
                    match self.config.role {
                        Role::Device => self.enter(Phase::Announce(self.config.align_threshold)),
                        Role::Host => self.enter_ready(out),
                    }
                }
                return;
            }
            // Partner still aligning: restart the count without an error.
            Some(class) if class.is_primitive() => self.align.reset(),
            _ => {
                self.on_framing_error(out);
                if self.phase != Phase::AlignWait {
                    return;
                }
            }
        }

        self.timer += 1;
        if self.timer >= self.training_timeout_ticks {
            tracing::warn!("No alignment progress at {}", self.grade);
            self.timer = 0;
            self.on_framing_error(out);
        }
    }

    /// Device: announces readiness with SYNCs before going Ready.
    pub(super) fn tick_announce(&mut self, remaining: u16, out: &mut LinkOutput) {
        out.tx = TxDirective::Pattern(encode(Primitive::Sync));
        if remaining <= 1 {
            self.enter_ready(out);
        } else {
            self.phase = Phase::Announce(remaining - 1);
        }
    }

    /// The device aligns on ALIGN; the host on the device's SYNC/idle.
    fn counts_toward_alignment(&self, class: CharClass) -> bool {
        match self.config.role {
            Role::Device => class == CharClass::Align,
            Role::Host => matches!(class, CharClass::Sync | CharClass::Idle),
        }
    }
}
