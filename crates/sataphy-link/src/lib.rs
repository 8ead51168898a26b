#![warn(missing_docs)]

//! sataphy-link: speed negotiator and RX/TX width converters.

mod alignment;
mod link_state;
/// Host/device link negotiation state machine.
pub mod negotiator;
mod rx_convert;
/// Link statistics tracking.
pub mod statistics;
mod status;
mod tx_convert;

pub use alignment::AlignmentCounter;
pub use link_state::LinkState;
pub use negotiator::{LinkDownReason, LinkEvent, LinkInput, LinkOutput, Negotiator, TxDirective};
pub use rx_convert::{RxConverter, RxTick};
pub use statistics::LinkStatistics;
pub use status::LinkStatus;
pub use tx_convert::{TxConverter, TxTick};
