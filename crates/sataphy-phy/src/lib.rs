#![warn(missing_docs)]

//! sataphy-phy: the top-level PHY composer plus simulated collaborators.
//!
//! [`Phy`] wires the negotiator and both width converters to a
//! [`Transceiver`](sataphy_core::transceiver::Transceiver) and a
//! [`ClockReset`](sataphy_core::clock::ClockReset) generator. The loopback
//! transceiver, the clock model and [`LinkBench`] let two PHYs negotiate
//! against each other in tests and demos.

/// Host/device link bench over the simulated collaborators.
pub mod bench;
/// Clock/reset generator model.
pub mod clock_reset;
/// Events published by the PHY.
pub mod event_types;
/// In-memory transceiver pair.
pub mod loopback;
/// The PHY composer.
pub mod phy;

pub use bench::{Endpoint, LinkBench, SimPhy};
pub use clock_reset::SimClockReset;
pub use event_types::PhyEvent;
pub use loopback::{loopback, SimTransceiver};
pub use phy::Phy;
