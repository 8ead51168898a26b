use sataphy_core::{
    clock::ClockReset,
    config::Config,
    error::Result,
    interceptor::{LaneInterceptor, NoOpInterceptor},
    lane::{OobBurst, RxLane, TxLane},
    speed::SpeedGrade,
    transceiver::Transceiver,
    Word,
};
use sataphy_link::{
    LinkInput, LinkState, LinkStatus, Negotiator, RxConverter, TxConverter, TxDirective,
};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::event_types::PhyEvent;

/// Top-level PHY: negotiator, width converters and the collaborators they drive.
///
/// Each call to [`tick`](Phy::tick) is one clock cycle. Upstream sees a word
/// sink ([`sink_ready`](Phy::sink_ready)) and a word source
/// ([`source`](Phy::source)); both are sampled before the tick mutates state.
pub struct Phy<T: Transceiver, C: ClockReset> {
    config: Config,
    transceiver: T,
    clock: C,
    negotiator: Negotiator,
    rx: RxConverter,
    tx: TxConverter,
    /// Burst requested while a word was still draining
    deferred_oob: Option<OobBurst>,
    /// The last tick held its received word unacknowledged
    rx_stalled: bool,
    interceptor: Box<dyn LaneInterceptor>,
    event_sender: Sender<PhyEvent>,
    event_receiver: Receiver<PhyEvent>,
    ticks: u64,
}

impl<T: Transceiver, C: ClockReset> std::fmt::Debug for Phy<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phy")
            .field("role", &self.config.role)
            .field("negotiator", &self.negotiator)
            .field("rx", &self.rx)
            .field("tx", &self.tx)
            .field("interceptor", &"<interceptor>")
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl<T: Transceiver, C: ClockReset> Phy<T, C> {
    /// Creates a PHY in Reset.
    pub fn new(config: &Config, transceiver: T, clock: C) -> Result<Self> {
        Self::with_interceptor(config, transceiver, clock, Box::new(NoOpInterceptor))
    }

    /// Creates a PHY whose lanes pass through `interceptor` at the transceiver boundary.
    pub fn with_interceptor(
        config: &Config,
        transceiver: T,
        clock: C,
        interceptor: Box<dyn LaneInterceptor>,
    ) -> Result<Self> {
        let negotiator = Negotiator::new(config)?;
        let (event_sender, event_receiver) = unbounded();
        Ok(Self {
            config: config.clone(),
            transceiver,
            clock,
            negotiator,
            rx: RxConverter::new(),
            tx: TxConverter::new(),
            deferred_oob: None,
            rx_stalled: false,
            interceptor,
            event_sender,
            event_receiver,
            ticks: 0,
        })
    }

    /// Returns true if a word offered to the next tick would be accepted.
    pub fn sink_ready(&self) -> bool {
        self.negotiator.is_ready() && self.tx.is_ready()
    }

    /// The received word offered upstream, if any.
    pub fn source(&self) -> Option<Word> {
        self.rx.source()
    }

    /// Advances one clock cycle.
    ///
    /// `sink` is the word upstream offers for transmission and `source_ack`
    /// acknowledges the word [`source`](Phy::source) returned before this call.
    /// Returns true if `sink` was accepted.
    pub fn tick(&mut self, sink: Option<Word>, source_ack: bool) -> bool {
        self.ticks += 1;

        let clock = self.clock.tick();
        if self.transceiver.line_rate() != clock.grade {
            self.transceiver.set_line_rate(clock.grade);
        }
        let mut lane = self.transceiver.receive();

        if clock.reset {
            self.domain_reset();
            self.transmit(TxLane::electrical_idle());
            return false;
        }

        if !self.interceptor.on_receive(&mut lane) {
            lane = RxLane::idle(lane.locked);
        }

        let was_ready = self.negotiator.is_ready();
        let received = self.rx.tick(lane.character, source_ack, was_ready);
        self.rx_stalled = received.stalled;
        if received.dropped_data() {
            self.negotiator.record_overrun();
            tracing::error!("Overrun: received word not acknowledged, data character dropped");
        }

        let out = self.negotiator.tick(&LinkInput {
            locked: lane.locked,
            crg_ready: clock.ready,
            line_rate: clock.grade,
            oob: lane.oob,
            rx: received.class,
        });
        if let Some(grade) = out.speed_request {
            self.clock.request_speed(grade);
        }
        if was_ready && !self.negotiator.is_ready() {
            self.rx.reset();
        }

        let (lane, accepted) = self.drive(out.tx, sink);
        self.transmit(lane);

        if let Some(event) = out.event {
            self.emit(event.into());
        }
        accepted
    }

    /// Selects the TX source; switches only at word boundaries.
    fn drive(&mut self, directive: TxDirective, sink: Option<Word>) -> (TxLane, bool) {
        let rate = self.transceiver.line_rate();

        if !self.tx.is_idle() {
            if let TxDirective::Oob(burst) = directive {
                self.deferred_oob = Some(burst);
            }
            let sent = self.tx.tick(None);
            return (TxLane::character(sent.character, rate), false);
        }
        if let Some(burst) = self.deferred_oob.take() {
            if directive != TxDirective::Upstream {
                return (TxLane::oob(burst), false);
            }
        }

        match directive {
            TxDirective::Upstream => {
                let sent = self.tx.tick(sink);
                (TxLane::character(sent.character, rate), sent.accepted)
            }
            TxDirective::Pattern(character) => (TxLane::character(character, rate), false),
            TxDirective::Oob(burst) => (TxLane::oob(burst), false),
            TxDirective::ElectricalIdle => (TxLane::electrical_idle(), false),
        }
    }

    fn transmit(&mut self, mut lane: TxLane) {
        if !self.interceptor.on_transmit(&mut lane) {
            lane = TxLane::electrical_idle();
        }
        self.transceiver.transmit(lane);
    }

    fn domain_reset(&mut self) {
        tracing::warn!("Domain reset in {}", self.negotiator.state());
        self.negotiator.reset();
        self.rx.reset();
        self.tx.reset();
        self.deferred_oob = None;
        self.rx_stalled = false;
        self.emit(PhyEvent::DomainReset);
    }

    fn emit(&self, event: PhyEvent) {
        if self.event_sender.send(event).is_err() {
            tracing::error!("Event channel closed, dropping {:?}", event);
        }
    }

    /// Receives the next pending event, if any.
    pub fn recv(&mut self) -> Option<PhyEvent> {
        match self.event_receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns a clone of the event receiver channel.
    pub fn event_receiver(&self) -> Receiver<PhyEvent> {
        self.event_receiver.clone()
    }

    /// Restarts negotiation from Reset at the default grade, clearing a permanent failure.
    pub fn request_negotiation(&mut self) {
        if let Some(event) = self.negotiator.request_negotiation() {
            self.rx.reset();
            self.emit(event.into());
        }
    }

    /// Read-only link snapshot.
    pub fn status(&self) -> LinkStatus {
        self.negotiator.status()
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.negotiator.state()
    }

    /// Returns true while upstream words flow.
    pub fn is_ready(&self) -> bool {
        self.negotiator.is_ready()
    }

    /// Current (or last negotiated) speed grade.
    pub fn grade(&self) -> SpeedGrade {
        self.negotiator.grade()
    }

    /// Returns true if the last tick stalled upstream: the received word was
    /// offered but not acknowledged, so the line character was not consumed.
    pub fn rx_stalled(&self) -> bool {
        self.rx_stalled
    }

    /// Returns true while a received word is partially assembled.
    pub fn is_assembling(&self) -> bool {
        self.rx.is_assembling()
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cycles elapsed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The transceiver.
    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Mutable access to the transceiver, for fault injection.
    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Mutable access to the clock/reset generator.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
