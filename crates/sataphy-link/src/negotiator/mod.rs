//! Speed negotiator.
//!
//! One state machine drives both ends of the link; the role selects the OOB
//! burst sequence and the training/alignment rules.
//!
//! ```text
//! Reset -> DetectOob -> NegotiateSpeed(grade) -> AlignWait -> Ready
//!   ^__________________________|______________________|__________|
//! ```
//!
//! # Module Organization
//!
//! - [`oob`] - role-selected COMRESET/COMINIT/COMWAKE sequences
//! - [`training`] - clock switch, speed training, alignment and fallback
//!
//! Every fault is retried here. Only exhausted retries surface, as status
//! flags and [`LinkEvent`]s.

mod oob;
mod training;


use sataphy_core::{
    config::{Config, Role},
    error::{LinkError, Result},
    lane::{Character, OobBurst, OobSignal},
    speed::SpeedGrade,
};
use sataphy_protocol::CharClass;

use self::oob::DEVICE_RESTART_STEP;
use crate::{
    alignment::AlignmentCounter, link_state::LinkState, statistics::LinkStatistics,
    status::LinkStatus,
};

/// Per-tick inputs to the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInput {
    /// Transceiver lock status
    pub locked: bool,
    /// Clock/reset generator reports stable clocks
    pub crg_ready: bool,
    /// Grade the clocks currently run at
    pub line_rate: SpeedGrade,
    /// OOB burst detected this tick
    pub oob: Option<OobBurst>,
    /// Classification of the received character, `None` if nothing was recovered
    pub rx: Option<CharClass>,
}

impl LinkInput {
    /// A locked, clocked tick with nothing received.
    pub fn idle(line_rate: SpeedGrade) -> Self {
        Self { locked: true, crg_ready: true, line_rate, oob: None, rx: None }
    }
}

/// What the transmitter should carry this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxDirective {
    /// Nothing on the line
    #[default]
    ElectricalIdle,
    /// An OOB burst
    Oob(OobBurst),
    /// A negotiator-supplied character, sent in place of upstream words
    Pattern(Character),
    /// Upstream words through the TX width converter
    Upstream,
}

/// Why the link left Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkDownReason {
    /// The transceiver lost lock
    LossOfLock,
    /// Too many framing errors without a run of valid characters
    FramingError,
    /// The partner restarted the OOB handshake
    PartnerReset,
    /// A new negotiation was requested
    Requested,
}

/// Notable link transitions, reported once each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEvent {
    /// The link reached Ready at the grade
    LinkUp(SpeedGrade),
    /// The link left Ready
    LinkDown(LinkDownReason),
    /// Training failed and the host stepped down a grade
    SpeedFallback {
        /// Grade that failed
        from: SpeedGrade,
        /// Grade tried next
        to: SpeedGrade,
    },
    /// OOB retries were exhausted; the negotiator cycles through Reset
    OobLinkDown,
    /// Training failed at every allowed grade; the negotiator halts in Reset
    NegotiationFailed,
}

/// Everything the negotiator drives during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkOutput {
    /// Transmit source
    pub tx: TxDirective,
    /// Grade to request from the clock/reset generator
    pub speed_request: Option<SpeedGrade>,
    /// Transition to report
    pub event: Option<LinkEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reset,
    /// Index into the role's OOB sequence
    DetectOob(usize),
    NegotiateSpeed { grade: SpeedGrade, clocked: bool },
    AlignWait,
    /// Device only: SYNCs still to send before Ready
    Announce(u16),
    Ready,
}

/// Host or device link negotiator.
#[derive(Debug, Clone)]
pub struct Negotiator {
    config: Config,
    phase: Phase,
    /// Session grade (host) or training grade (device)
    grade: SpeedGrade,
    /// Grade carried by the host's COMWAKE
    proposal: Option<SpeedGrade>,
    hold: u32,
    timer: u32,
    oob_retries: u8,
    fallbacks: u8,
    align: AlignmentCounter,
    align_errors: u8,
    halted: bool,
    /// Device: COMRESET seen during the Reset hold, answered once it elapses
    pending_comreset: bool,
    link_down: bool,
    failure: Option<LinkError>,
    statistics: LinkStatistics,

    reset_hold_ticks: u32,
    oob_timeout_ticks: u32,
    training_timeout_ticks: u32,
}

impl Negotiator {
    /// Creates a negotiator in Reset. Fails if the configuration is invalid.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config.clone()))
    }

    fn from_config(config: Config) -> Self {
        Self {
            phase: Phase::Reset,
            grade: config.default_speed,
            proposal: None,
            hold: 0,
            timer: 0,
            oob_retries: 0,
            fallbacks: 0,
            align: AlignmentCounter::new(config.align_threshold),
            align_errors: 0,
            halted: false,
            pending_comreset: false,
            link_down: false,
            failure: None,
            statistics: LinkStatistics::default(),
            reset_hold_ticks: config.reset_hold_ticks(),
            oob_timeout_ticks: config.oob_timeout_ticks(),
            training_timeout_ticks: config.training_timeout_ticks(),
            config,
        }
    }

    /// Advances one tick.
    pub fn tick(&mut self, input: &LinkInput) -> LinkOutput {
        let mut out = LinkOutput::default();

        if !input.locked && self.phase != Phase::Reset {
            tracing::warn!("Transceiver lost lock in {}", self.state());
            self.fall_back(LinkDownReason::LossOfLock, &mut out);
            return out;
        }
        if self.restart_on_comreset(input, &mut out) {
            return out;
        }

        match self.phase {
            Phase::Reset => self.tick_reset(input),
            Phase::DetectOob(step) => self.tick_detect_oob(step, input, &mut out),
            Phase::NegotiateSpeed { grade, clocked } => {
                self.tick_negotiate_speed(grade, clocked, input, &mut out)
            }
            Phase::AlignWait => self.tick_align_wait(input, &mut out),
            Phase::Announce(remaining) => self.tick_announce(remaining, &mut out),
            Phase::Ready => self.tick_ready(input, &mut out),
        }
        out
    }

    /// Clears a permanent failure and renegotiates from Reset at the default grade.
    ///
    /// Returns the link-down event if the link was up.
    pub fn request_negotiation(&mut self) -> Option<LinkEvent> {
        tracing::debug!("Negotiation requested in {}", self.state());
        let was_ready = self.is_ready();
        if was_ready {
            self.statistics.link_losses += 1;
        }
        self.halted = false;
        self.link_down = false;
        self.failure = None;
        self.oob_retries = 0;
        self.enter(Phase::Reset);
        was_ready.then_some(LinkEvent::LinkDown(LinkDownReason::Requested))
    }

    /// Returns to the power-on state, statistics included.
    pub fn reset(&mut self) {
        *self = Self::from_config(self.config.clone());
    }

    /// Counts a received data character that upstream backpressure dropped.
    pub fn record_overrun(&mut self) {
        self.statistics.overruns += 1;
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        match self.phase {
            Phase::Reset => LinkState::Reset,
            Phase::DetectOob(_) => LinkState::DetectOob,
            Phase::NegotiateSpeed { grade, .. } => LinkState::NegotiateSpeed(grade),
            Phase::AlignWait | Phase::Announce(_) => LinkState::AlignWait,
            Phase::Ready => LinkState::Ready,
        }
    }

    /// Returns true while upstream words may flow.
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Current (or last negotiated) speed grade.
    pub fn grade(&self) -> SpeedGrade {
        self.grade
    }

    /// Returns true after a permanent negotiation failure.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns true once OOB retries were exhausted, until the link comes up.
    pub fn is_link_down(&self) -> bool {
        self.link_down
    }

    /// Last fault surfaced after its retries ran out.
    pub fn failure(&self) -> Option<LinkError> {
        self.failure
    }

    /// Cumulative counters.
    pub fn statistics(&self) -> &LinkStatistics {
        &self.statistics
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Role of this end of the link.
    pub fn role(&self) -> Role {
        self.config.role
    }

    /// Snapshot for upper layers.
    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state(),
            grade: self.grade,
            ready: self.is_ready(),
            link_down: self.link_down,
            failure: self.failure,
            halted: self.halted,
            statistics: self.statistics,
        }
    }

    fn enter(&mut self, phase: Phase) {
        let from = self.state();
        self.phase = phase;
        self.timer = 0;
        self.hold = 0;
        if phase == Phase::Reset {
            self.pending_comreset = false;
        }
        let to = self.state();
        if from != to {
            tracing::debug!("Link state {} -> {}", from, to);
        }
    }

    /// Every exit from Reset starts a session at the default grade.
    fn start_session(&mut self) {
        self.grade = self.config.default_speed;
        self.proposal = None;
        self.fallbacks = 0;
        self.align.reset();
        self.align_errors = 0;
    }

    fn tick_reset(&mut self, input: &LinkInput) {
        if !input.locked {
            self.pending_comreset = false;
        }
        if self.halted || !input.locked || !input.crg_ready {
            return;
        }
        self.hold += 1;
        if self.hold >= self.reset_hold_ticks {
            let step = if std::mem::take(&mut self.pending_comreset) {
                DEVICE_RESTART_STEP
            } else {
                0
            };
            self.start_session();
            self.enter(Phase::DetectOob(step));
        }
    }

    fn tick_ready(&mut self, input: &LinkInput, out: &mut LinkOutput) {
        out.tx = TxDirective::Upstream;

        let cominit = input.oob.is_some_and(|b| b.signal == OobSignal::ComInit);
        if self.config.role == Role::Host && cominit {
            tracing::warn!("COMINIT from device while ready");
            self.fall_back(LinkDownReason::PartnerReset, out);
            return;
        }

        match input.rx {
            Some(class) if !class.is_unknown() => {
                if self.align.record_valid() {
                    self.align_errors = 0;
                }
            }
            _ => self.on_framing_error(out),
        }
    }

    fn enter_ready(&mut self, out: &mut LinkOutput) {
        self.align.reset();
        self.align_errors = 0;
        self.link_down = false;
        self.failure = None;
        self.statistics.link_ups += 1;
        out.event = Some(LinkEvent::LinkUp(self.grade));
        self.enter(Phase::Ready);
        tracing::debug!("Link up at {}", self.grade);
    }

    /// Returns to Reset, reporting the loss if the link was up.
    fn fall_back(&mut self, reason: LinkDownReason, out: &mut LinkOutput) {
        if self.phase == Phase::Ready {
            self.link_lost(reason, out);
        }
        out.tx = TxDirective::ElectricalIdle;
        self.enter(Phase::Reset);
    }

    fn link_lost(&mut self, reason: LinkDownReason, out: &mut LinkOutput) {
        self.statistics.link_losses += 1;
        out.event = Some(LinkEvent::LinkDown(reason));
        tracing::warn!("Link down at {}: {:?}", self.grade, reason);
    }

    fn on_framing_error(&mut self, out: &mut LinkOutput) {
        self.statistics.framing_errors += 1;
        self.align.reset();
        self.align_errors = self.align_errors.saturating_add(1);
        if self.align_errors > self.config.max_align_retries {
            tracing::warn!(
                "{} framing errors in {}, falling back to Reset",
                self.align_errors,
                self.state()
            );
            self.fall_back(LinkDownReason::FramingError, out);
        } else {
            tracing::warn!(
                "Framing error in {} ({}/{})",
                self.state(),
                self.align_errors,
                self.config.max_align_retries
            );
        }
    }
}
