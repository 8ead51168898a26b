#![warn(missing_docs)]

//! sataphy-core: foundational types and utilities.
//!
//! This crate provides the minimal set of types shared across all layers:
//! - Configuration types (`Config`, `ConfigBuilder`, `Role`)
//! - Speed grades
//! - Error handling
//! - Link constants and their conservative defaults
//! - Transceiver-facing lane types and the collaborator traits
//!
//! Link logic lives in specialized crates:
//! - `sataphy-protocol`: primitive codec and word packing
//! - `sataphy-link`: speed negotiator, RX/TX width converters
//! - `sataphy-phy`: top-level composer and collaborator models

/// Link constants shared across layers.
///
/// The protocol does not mandate exact retry counts, timeouts or the
/// alignment threshold; these are the defaults `Config` starts from.
pub mod constants {
    /// Number of transceiver characters carried by one internal word.
    pub const CHARS_PER_WORD: usize = 4;
    /// Default reference clock frequency in Hz (SATA Gen3 user clock).
    pub const DEFAULT_CLK_FREQ: u32 = 150_000_000;
    /// Default time spent in Reset with TX in electrical idle, in microseconds.
    pub const DEFAULT_RESET_HOLD_US: u64 = 10;
    /// Default time to wait for the partner's OOB response, in microseconds.
    pub const DEFAULT_OOB_TIMEOUT_US: u64 = 880;
    /// Default number of OOB retries before link-down is reported.
    pub const DEFAULT_MAX_OOB_RETRIES: u8 = 4;
    /// Default time allowed for training at one speed grade, in microseconds.
    pub const DEFAULT_TRAINING_TIMEOUT_US: u64 = 880;
    /// Default number of speed step-downs before negotiation fails for good.
    pub const DEFAULT_MAX_TRAINING_RETRIES: u8 = 2;
    /// Default number of consecutive valid primitives needed to declare alignment.
    pub const DEFAULT_ALIGN_THRESHOLD: u16 = 8;
    /// Default number of framing errors tolerated before falling back to Reset.
    pub const DEFAULT_MAX_ALIGN_RETRIES: u8 = 4;
}

/// Clock/reset generator collaborator.
pub mod clock;
/// Configuration options for the link core.
pub mod config;
/// Error types and results.
pub mod error;
/// Lane interception for fault injection and inspection.
pub mod interceptor;
/// Characters, OOB bursts and per-tick transceiver lanes.
pub mod lane;
/// Ranked link speed grades.
pub mod speed;
/// Transceiver abstraction for pluggable serializer/deserializer models.
pub mod transceiver;

/// A 32-bit internal data unit.
pub type Word = u32;
