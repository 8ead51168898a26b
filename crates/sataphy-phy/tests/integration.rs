//! Integration tests for the sataphy-phy crate.
//!
//! Every test drives a host and a device PHY over the loopback transceivers
//! and clock models, so the negotiator, both width converters and the
//! composer's TX selection run together.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::Rng;
use sataphy_core::{
    config::{Config, Role},
    error::LinkError,
    interceptor::{LaneInterceptor, NoOpInterceptor},
    lane::{Character, RxLane, TxLane},
    speed::SpeedGrade,
    Word,
};
use sataphy_link::{LinkDownReason, LinkState, LinkStatistics};
use sataphy_phy::{loopback, LinkBench, Phy, PhyEvent, SimClockReset};

fn config(role: Role, max: SpeedGrade) -> Config {
    Config {
        role,
        default_speed: max,
        clk_freq: 1_000_000,
        reset_hold: Duration::from_micros(4),
        oob_timeout: Duration::from_micros(40),
        training_timeout: Duration::from_micros(200),
        ..Config::default()
    }
}

fn bench(host: SpeedGrade, device: SpeedGrade) -> LinkBench {
    LinkBench::new(&config(Role::Host, host), &config(Role::Device, device)).unwrap()
}

fn linked(host: SpeedGrade, device: SpeedGrade) -> LinkBench {
    let mut bench = bench(host, device);
    bench.run_until_linked(5_000).expect("link never came up");
    bench
}

/// Lets queued words drain and the receivers catch up.
fn settle(bench: &mut LinkBench) {
    bench
        .run_until(5_000, |b| b.host.pending() == 0 && b.device.pending() == 0)
        .expect("words never drained");
    bench.run(20);
}

/// Blanks every received character while the flag is set; OOB bursts still pass.
struct Blindfold(Arc<AtomicBool>);

impl LaneInterceptor for Blindfold {
    fn on_receive(&mut self, lane: &mut RxLane) -> bool {
        if self.0.load(Ordering::SeqCst) {
            lane.character = None;
        }
        true
    }

    fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
        true
    }
}

/// Replaces the n-th received data character with an undefined control character.
struct CorruptNthData {
    seen: usize,
    target: usize,
}

impl LaneInterceptor for CorruptNthData {
    fn on_receive(&mut self, lane: &mut RxLane) -> bool {
        if let Some(character) = lane.character.as_mut().filter(|c| !c.control) {
            self.seen += 1;
            if self.seen == self.target {
                *character = Character::control(0xFF);
            }
        }
        true
    }

    fn on_transmit(&mut self, _lane: &mut TxLane) -> bool {
        true
    }
}

#[test]
fn test_gen3_host_and_gen2_device_settle_on_gen2() {
    let bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen2);

    assert_eq!(bench.host.phy().grade(), SpeedGrade::Gen2);
    assert_eq!(bench.device.phy().grade(), SpeedGrade::Gen2);
    assert_eq!(
        bench.host.events(),
        &[
            PhyEvent::SpeedFallback { from: SpeedGrade::Gen3, to: SpeedGrade::Gen2 },
            PhyEvent::LinkUp(SpeedGrade::Gen2),
        ]
    );
    assert_eq!(bench.device.events(), &[PhyEvent::LinkUp(SpeedGrade::Gen2)]);
    assert_eq!(bench.host.phy().status().statistics.speed_fallbacks, 1);
}

#[test]
fn test_words_flow_both_ways() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    bench.host.send([0x0102_0304, 0xDEAD_BEEF]);
    bench.device.send([0xCAFE_F00D]);
    settle(&mut bench);

    assert_eq!(bench.device.received(), &[0x0102_0304, 0xDEAD_BEEF]);
    assert_eq!(bench.host.received(), &[0xCAFE_F00D]);
    assert_eq!(bench.host.phy().status().statistics.total_errors(), 0);
    assert_eq!(bench.device.phy().status().statistics.total_errors(), 0);
}

#[test]
fn test_random_words_round_trip() {
    let mut rng = rand::rng();
    let down: Vec<Word> = (0..300).map(|_| rng.random()).collect();
    let up: Vec<Word> = (0..300).map(|_| rng.random()).collect();

    let mut bench = linked(SpeedGrade::Gen2, SpeedGrade::Gen3);
    bench.host.send(down.iter().copied());
    bench.device.send(up.iter().copied());
    settle(&mut bench);

    assert_eq!(bench.device.received(), down.as_slice());
    assert_eq!(bench.host.received(), up.as_slice());
}

#[test]
fn test_lock_loss_in_ready_discards_partial_word() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    let words: Vec<Word> = (1..=50).map(|i| i * 0x0101_0101).collect();
    bench.device.send(words.iter().copied());
    bench
        .run_until(1_000, |b| b.host.phy().is_assembling())
        .expect("no word in flight");

    bench.host.phy_mut().transceiver_mut().set_locked(false);
    bench.tick();

    let host = &bench.host;
    assert_eq!(host.phy().state(), LinkState::Reset);
    assert!(!host.phy().is_assembling());
    assert_eq!(host.phy().source(), None);
    assert_eq!(host.events().last(), Some(&PhyEvent::LinkDown(LinkDownReason::LossOfLock)));

    // Only whole words made it upstream, in order.
    let received = host.received();
    assert!(received.len() < words.len());
    assert_eq!(received, &words[..received.len()]);
}

#[test]
fn test_unknown_character_mid_word_drops_only_that_word() {
    let words: [Word; 5] = [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444, 0x5555_5555];
    // Second byte of the third word.
    let corrupt = CorruptNthData { seen: 0, target: 10 };
    let mut bench = LinkBench::with_interceptors(
        &config(Role::Host, SpeedGrade::Gen3),
        &config(Role::Device, SpeedGrade::Gen3),
        Box::new(corrupt),
        Box::new(NoOpInterceptor),
    )
    .unwrap();
    bench.run_until_linked(5_000).expect("link never came up");
    let errors_before = bench.host.phy().status().statistics.framing_errors;

    bench.device.send(words[..3].iter().copied());
    settle(&mut bench);
    assert_eq!(bench.host.received(), &words[..2]);
    assert_eq!(bench.host.phy().status().statistics.framing_errors, errors_before + 1);
    assert!(bench.host.phy().is_ready());

    bench.device.send(words[3..].iter().copied());
    settle(&mut bench);
    assert_eq!(bench.host.received(), &[words[0], words[1], words[3], words[4]]);
}

#[test]
fn test_backpressure_holds_word_without_loss() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    bench.host.withhold_ack(true);
    bench.device.send([0xDEAD_BEEF]);
    bench.run_until(100, |b| b.host.phy().source().is_some()).expect("word never arrived");

    assert!(!bench.host.phy().rx_stalled());

    for _ in 0..50 {
        bench.tick();
        assert!(bench.host.phy().rx_stalled());
        assert_eq!(bench.host.phy().source(), Some(0xDEAD_BEEF));
        assert!(bench.host.received().is_empty());
    }
    assert_eq!(bench.host.stalled_ticks(), 50);

    bench.host.withhold_ack(false);
    bench.tick();
    assert!(!bench.host.phy().rx_stalled());
    assert_eq!(bench.host.stalled_ticks(), 50);
    assert_eq!(bench.host.received(), &[0xDEAD_BEEF]);
    assert_eq!(bench.host.phy().source(), None);
    assert_eq!(bench.host.phy().status().statistics.overruns, 0);
}

#[test]
fn test_overrun_is_counted_and_receiver_resyncs() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    bench.host.withhold_ack(true);
    bench.device.send([1, 2, 3]);
    settle(&mut bench);
    assert!(bench.host.phy().status().statistics.overruns > 0);
    assert!(bench.host.phy().is_ready());

    bench.host.withhold_ack(false);
    bench.run(5);
    bench.device.send([4]);
    settle(&mut bench);

    assert_eq!(bench.host.received(), &[1, 4]);
}

#[test]
fn test_in_flight_word_drains_before_source_switch() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    bench.host.send([0xA5A5_0001]);
    bench.tick();
    assert_eq!(bench.host.pending(), 0);

    // Leaves Ready with three characters of the word still to send.
    bench.host.phy_mut().request_negotiation();
    bench.run(6);
    assert_eq!(bench.device.received(), &[0xA5A5_0001]);
}

#[test]
fn test_renegotiation_reproduces_grade() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen2);
    bench.host.take_events();

    bench.host.phy_mut().request_negotiation();
    assert_eq!(bench.host.phy().state(), LinkState::Reset);
    bench.run_until_linked(5_000).expect("link never came back");

    assert_eq!(bench.host.phy().grade(), SpeedGrade::Gen2);
    assert_eq!(bench.device.phy().grade(), SpeedGrade::Gen2);
    assert_eq!(bench.host.events().first(), Some(&PhyEvent::LinkDown(LinkDownReason::Requested)));
    assert_eq!(bench.host.events().last(), Some(&PhyEvent::LinkUp(SpeedGrade::Gen2)));
}

#[test]
fn test_forced_domain_reset_restarts_link() {
    let mut bench = linked(SpeedGrade::Gen3, SpeedGrade::Gen3);
    bench.host.take_events();

    bench.host.phy_mut().clock_mut().force_reset();
    bench.tick();

    assert_eq!(bench.host.events(), &[PhyEvent::DomainReset]);
    assert_eq!(bench.host.phy().state(), LinkState::Reset);
    assert_eq!(bench.host.phy().status().statistics, LinkStatistics::default());

    bench.run_until_linked(5_000).expect("link never came back");
    assert_eq!(bench.host.phy().grade(), SpeedGrade::Gen3);
}

#[test]
fn test_zero_oob_retries_report_link_down_on_first_timeout() {
    let host = Config { max_oob_retries: 0, ..config(Role::Host, SpeedGrade::Gen3) };
    // The partner end exists but is never ticked, so no burst is ever answered.
    let (line, _silent) = loopback();
    let mut phy = Phy::new(&host, line, SimClockReset::new(SpeedGrade::Gen1, 0)).unwrap();

    let mut first = None;
    for tick in 1..=100u64 {
        phy.tick(None, false);
        if let Some(event) = phy.recv() {
            first = Some((tick, event));
            break;
        }
    }

    let (tick, event) = first.expect("no link-down reported");
    assert_eq!(event, PhyEvent::OobLinkDown);
    // One reset hold plus one timeout, not a retry cycle.
    assert!(tick < 60);
    assert!(phy.status().link_down);
    assert_eq!(phy.status().failure, Some(LinkError::OobTimeout));
}

#[test]
fn test_zero_training_retries_fail_without_fallback() {
    let host = Config { max_training_retries: 0, ..config(Role::Host, SpeedGrade::Gen3) };
    let device = config(Role::Device, SpeedGrade::Gen1);
    let mut bench = LinkBench::new(&host, &device).unwrap();

    bench.run_until(5_000, |b| b.host.phy().status().halted).expect("never gave up");
    assert_eq!(bench.host.events(), &[PhyEvent::NegotiationFailed]);
    assert_eq!(bench.host.phy().status().failure, Some(LinkError::TrainingFailure));

    // Halted: nothing more happens until a new request.
    bench.run(1_000);
    assert_eq!(bench.host.events(), &[PhyEvent::NegotiationFailed]);
    assert_eq!(bench.host.phy().state(), LinkState::Reset);
}

#[test]
fn test_permanent_failure_then_new_request_links() {
    let blind = Arc::new(AtomicBool::new(true));
    let mut bench = LinkBench::with_interceptors(
        &config(Role::Host, SpeedGrade::Gen3),
        &config(Role::Device, SpeedGrade::Gen3),
        Box::new(Blindfold(blind.clone())),
        Box::new(NoOpInterceptor),
    )
    .unwrap();

    bench.run_until(10_000, |b| b.host.phy().status().halted).expect("never gave up");
    assert_eq!(
        bench.host.events(),
        &[
            PhyEvent::SpeedFallback { from: SpeedGrade::Gen3, to: SpeedGrade::Gen2 },
            PhyEvent::SpeedFallback { from: SpeedGrade::Gen2, to: SpeedGrade::Gen1 },
            PhyEvent::NegotiationFailed,
        ]
    );

    blind.store(false, Ordering::SeqCst);
    bench.host.phy_mut().request_negotiation();
    assert!(!bench.host.phy().status().halted);
    bench.run_until_linked(5_000).expect("link never came up after the new request");
    assert_eq!(bench.host.phy().grade(), SpeedGrade::Gen3);
}

#[test]
fn test_events_are_observable_through_cloned_receiver() {
    let mut bench = bench(SpeedGrade::Gen1, SpeedGrade::Gen1);
    let events = bench.device.phy().event_receiver();
    bench.run_until_linked(5_000).expect("link never came up");

    // The endpoint drains the same channel, so the clone sees whatever it has not taken yet.
    assert!(events.try_recv().is_err());
    assert_eq!(bench.device.events(), &[PhyEvent::LinkUp(SpeedGrade::Gen1)]);
}
