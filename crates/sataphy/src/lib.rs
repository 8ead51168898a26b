#![warn(missing_docs)]

//! sataphy: a small public API facade for the workspace.
//!
//! This crate re-exports the most commonly used types to bring up a SATA PHY
//! link and move words across it:
//!
//! - The composer and its events (`Phy`, `PhyEvent`)
//! - Collaborator traits and the simulated models (`Transceiver`, `ClockReset`, `LinkBench`)
//! - Core configuration (`Config`, `ConfigBuilder`, `Role`, `SpeedGrade`)
//!
//! Example
//! ```
//! use sataphy::{Config, LinkBench, PhyEvent, Role, SpeedGrade};
//! use std::time::Duration;
//!
//! let host = Config {
//!     clk_freq: 1_000_000,
//!     reset_hold: Duration::from_micros(4),
//!     oob_timeout: Duration::from_micros(40),
//!     training_timeout: Duration::from_micros(200),
//!     ..Config::host()
//! };
//! let device = Config { role: Role::Device, ..host.clone() };
//!
//! let mut bench = LinkBench::new(&host, &device).unwrap();
//! bench.run_until_linked(5_000).unwrap();
//! assert_eq!(bench.host.events(), &[PhyEvent::LinkUp(SpeedGrade::Gen3)]);
//!
//! bench.host.send([0xDEAD_BEEF]);
//! bench.run(20);
//! assert_eq!(bench.device.received(), &[0xDEAD_BEEF]);
//! ```

// Core config, speed grades, errors and collaborator traits
pub use sataphy_core::{
    clock::{ClockReset, ClockStatus},
    config::{Config, ConfigBuilder, Role},
    error::{ErrorKind, LinkError, Result},
    interceptor::{LaneInterceptor, NoOpInterceptor},
    lane::{Character, OobBurst, OobSignal, RxLane, TxLane},
    speed::SpeedGrade,
    transceiver::Transceiver,
    Word,
};
// Link: negotiator state and statistics
pub use sataphy_link::{LinkDownReason, LinkState, LinkStatistics, LinkStatus};
// PHY: composer, events and simulated collaborators
pub use sataphy_phy::{loopback, LinkBench, Phy, PhyEvent, SimClockReset, SimTransceiver};
// Protocol: primitive codec
pub use sataphy_protocol::{classify, encode, CharClass, Primitive};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        ClockReset, Config, ConfigBuilder, LaneInterceptor, LinkBench, LinkState, Phy, PhyEvent,
        Role, SpeedGrade, Transceiver, Word,
    };
}
