//! Host/device link bench.
//!
//! Two [`Phy`] instances over a [`loopback`] pair, each with its own
//! [`SimClockReset`], driven in lockstep. Each end plays the upstream layer:
//! it offers queued words to the sink, acknowledges received words (unless
//! told to withhold) and records every event.

use std::collections::VecDeque;

use sataphy_core::{
    config::Config,
    error::Result,
    interceptor::{LaneInterceptor, NoOpInterceptor},
    speed::SpeedGrade,
    Word,
};

use crate::{
    clock_reset::SimClockReset,
    event_types::PhyEvent,
    loopback::{loopback, SimTransceiver},
    phy::Phy,
};

/// Retune time of the bench clock generators, in ticks.
pub const DEFAULT_SETTLE_TICKS: u32 = 16;

/// A PHY on the bench.
pub type SimPhy = Phy<SimTransceiver, SimClockReset>;

/// One end of the bench together with its upstream model.
#[derive(Debug)]
pub struct Endpoint {
    phy: SimPhy,
    outbound: VecDeque<Word>,
    received: Vec<Word>,
    events: Vec<PhyEvent>,
    withhold_ack: bool,
    stalled_ticks: u64,
}

impl Endpoint {
    fn new(phy: SimPhy) -> Self {
        Self {
            phy,
            outbound: VecDeque::new(),
            received: Vec::new(),
            events: Vec::new(),
            withhold_ack: false,
            stalled_ticks: 0,
        }
    }

    fn tick(&mut self) {
        let offer = if self.phy.sink_ready() { self.outbound.front().copied() } else { None };
        let source = self.phy.source();
        let ack = source.is_some() && !self.withhold_ack;

        if self.phy.tick(offer, ack) {
            self.outbound.pop_front();
        }
        if self.phy.rx_stalled() {
            self.stalled_ticks += 1;
        }
        if let Some(word) = source.filter(|_| ack) {
            self.received.push(word);
        }
        while let Some(event) = self.phy.recv() {
            self.events.push(event);
        }
    }

    /// Queues words for transmission.
    pub fn send(&mut self, words: impl IntoIterator<Item = Word>) {
        self.outbound.extend(words);
    }

    /// Words not yet accepted by the PHY.
    pub fn pending(&self) -> usize {
        self.outbound.len()
    }

    /// Words received and acknowledged so far.
    pub fn received(&self) -> &[Word] {
        &self.received
    }

    /// Takes the received words, leaving the list empty.
    pub fn take_received(&mut self) -> Vec<Word> {
        std::mem::take(&mut self.received)
    }

    /// Every event seen so far.
    pub fn events(&self) -> &[PhyEvent] {
        &self.events
    }

    /// Takes the recorded events, leaving the list empty.
    pub fn take_events(&mut self) -> Vec<PhyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stops (or resumes) acknowledging received words.
    pub fn withhold_ack(&mut self, withhold: bool) {
        self.withhold_ack = withhold;
    }

    /// Ticks on which the PHY reported an RX stall.
    pub fn stalled_ticks(&self) -> u64 {
        self.stalled_ticks
    }

    /// The PHY.
    pub fn phy(&self) -> &SimPhy {
        &self.phy
    }

    /// Mutable access to the PHY.
    pub fn phy_mut(&mut self) -> &mut SimPhy {
        &mut self.phy
    }
}

/// Host and device PHYs wired back to back.
#[derive(Debug)]
pub struct LinkBench {
    /// Host end
    pub host: Endpoint,
    /// Device end
    pub device: Endpoint,
    ticks: u64,
}

impl LinkBench {
    /// Builds a bench with pass-through lanes.
    pub fn new(host: &Config, device: &Config) -> Result<Self> {
        Self::with_interceptors(host, device, Box::new(NoOpInterceptor), Box::new(NoOpInterceptor))
    }

    /// Builds a bench whose ends filter their lanes through the given interceptors.
    pub fn with_interceptors(
        host: &Config,
        device: &Config,
        host_interceptor: Box<dyn LaneInterceptor>,
        device_interceptor: Box<dyn LaneInterceptor>,
    ) -> Result<Self> {
        let (host_line, device_line) = loopback();
        let host_clock = SimClockReset::new(SpeedGrade::LOWEST, DEFAULT_SETTLE_TICKS);
        let device_clock = SimClockReset::new(SpeedGrade::LOWEST, DEFAULT_SETTLE_TICKS);
        Ok(Self {
            host: Endpoint::new(Phy::with_interceptor(host, host_line, host_clock, host_interceptor)?),
            device: Endpoint::new(Phy::with_interceptor(
                device,
                device_line,
                device_clock,
                device_interceptor,
            )?),
            ticks: 0,
        })
    }

    /// Advances both ends one tick, host first.
    pub fn tick(&mut self) {
        self.host.tick();
        self.device.tick();
        self.ticks += 1;
    }

    /// Advances `n` ticks.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Ticks until `done` holds, at most `max_ticks` times.
    ///
    /// Returns the number of ticks taken, or `None` if `done` never held.
    pub fn run_until(
        &mut self,
        max_ticks: u64,
        mut done: impl FnMut(&LinkBench) -> bool,
    ) -> Option<u64> {
        for taken in 1..=max_ticks {
            self.tick();
            if done(self) {
                return Some(taken);
            }
        }
        None
    }

    /// Ticks until both ends are Ready.
    pub fn run_until_linked(&mut self, max_ticks: u64) -> Option<u64> {
        self.run_until(max_ticks, LinkBench::is_linked)
    }

    /// Returns true if both ends are Ready.
    pub fn is_linked(&self) -> bool {
        self.host.phy.is_ready() && self.device.phy.is_ready()
    }

    /// Ticks elapsed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
