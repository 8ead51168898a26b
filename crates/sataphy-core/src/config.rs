use std::{default::Default, time::Duration};

use crate::{
    constants::{
        DEFAULT_ALIGN_THRESHOLD, DEFAULT_CLK_FREQ, DEFAULT_MAX_ALIGN_RETRIES,
        DEFAULT_MAX_OOB_RETRIES, DEFAULT_MAX_TRAINING_RETRIES, DEFAULT_OOB_TIMEOUT_US,
        DEFAULT_RESET_HOLD_US, DEFAULT_TRAINING_TIMEOUT_US,
    },
    error::{ConfigError, Result},
    speed::SpeedGrade,
};

/// Which end of the link this core sits on.
///
/// The host initiates every OOB burst and proposes the speed grade; the
/// device only responds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Initiator side (controller)
    Host,
    /// Responder side (drive)
    Device,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Configuration options for the link core.
///
/// Fixed at construction; components keep their own copy and never mutate it.
pub struct Config {
    /// Host or device role.
    pub role: Role,
    /// Reference clock frequency in Hz. All timeouts are counted in ticks of this clock.
    pub clk_freq: u32,
    /// Host: the grade the first negotiation session proposes.
    /// Device: the fastest grade it supports.
    pub default_speed: SpeedGrade,
    /// Time spent in Reset (electrical idle) before OOB detection starts.
    pub reset_hold: Duration,
    /// Max wait for the partner's OOB response burst.
    pub oob_timeout: Duration,
    /// OOB retries before link-down is reported (0 = report on first timeout).
    pub max_oob_retries: u8,
    /// Max time allowed for training at one grade, and for a silent AlignWait.
    pub training_timeout: Duration,
    /// Speed step-downs allowed per session before permanent failure (0 = fail on first).
    pub max_training_retries: u8,
    /// Consecutive valid primitives required to declare alignment.
    pub align_threshold: u16,
    /// Framing errors tolerated while aligning or ready before falling back to Reset.
    pub max_align_retries: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: Role::Host,
            clk_freq: DEFAULT_CLK_FREQ,
            default_speed: SpeedGrade::Gen3,
            reset_hold: Duration::from_micros(DEFAULT_RESET_HOLD_US),
            oob_timeout: Duration::from_micros(DEFAULT_OOB_TIMEOUT_US),
            max_oob_retries: DEFAULT_MAX_OOB_RETRIES,
            training_timeout: Duration::from_micros(DEFAULT_TRAINING_TIMEOUT_US),
            max_training_retries: DEFAULT_MAX_TRAINING_RETRIES,
            align_threshold: DEFAULT_ALIGN_THRESHOLD,
            max_align_retries: DEFAULT_MAX_ALIGN_RETRIES,
        }
    }
}

impl Config {
    /// Default configuration for the host role.
    pub fn host() -> Self {
        Self::default()
    }

    /// Default configuration for the device role.
    pub fn device() -> Self {
        Self { role: Role::Device, ..Self::default() }
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.clk_freq == 0 {
            return Err(ConfigError::ZeroClockFrequency.into());
        }
        if self.align_threshold == 0 {
            return Err(ConfigError::ZeroAlignThreshold.into());
        }
        for (name, value) in [
            ("reset_hold", self.reset_hold),
            ("oob_timeout", self.oob_timeout),
            ("training_timeout", self.training_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name).into());
            }
        }
        Ok(())
    }

    /// Converts a duration to ticks of the reference clock, never less than one.
    pub fn ticks(&self, duration: Duration) -> u32 {
        let ticks = duration.as_nanos() * u128::from(self.clk_freq) / 1_000_000_000;
        ticks.clamp(1, u128::from(u32::MAX)) as u32
    }

    /// Reset hold time in ticks.
    pub fn reset_hold_ticks(&self) -> u32 {
        self.ticks(self.reset_hold)
    }

    /// OOB response timeout in ticks.
    pub fn oob_timeout_ticks(&self) -> u32 {
        self.ticks(self.oob_timeout)
    }

    /// Training timeout in ticks.
    pub fn training_timeout_ticks(&self) -> u32 {
        self.ticks(self.training_timeout)
    }
}

/// Set-once builder for [`Config`].
///
/// Once [`finalize`](ConfigBuilder::finalize) has succeeded every further
/// setter call, and a second `finalize`, fails with
/// [`ConfigError::AlreadyFinalized`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
    finalized: bool,
}

impl ConfigBuilder {
    /// Starts from the defaults for `role`.
    pub fn new(role: Role) -> Self {
        let config = match role {
            Role::Host => Config::host(),
            Role::Device => Config::device(),
        };
        Self { config, finalized: false }
    }

    fn modify(&mut self, apply: impl FnOnce(&mut Config)) -> Result<&mut Self> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized.into());
        }
        apply(&mut self.config);
        Ok(self)
    }

    /// Sets the reference clock frequency in Hz.
    pub fn clk_freq(&mut self, hz: u32) -> Result<&mut Self> {
        self.modify(|c| c.clk_freq = hz)
    }

    /// Sets the default (host) or maximum (device) speed grade.
    pub fn default_speed(&mut self, grade: SpeedGrade) -> Result<&mut Self> {
        self.modify(|c| c.default_speed = grade)
    }

    /// Sets the Reset hold time.
    pub fn reset_hold(&mut self, duration: Duration) -> Result<&mut Self> {
        self.modify(|c| c.reset_hold = duration)
    }

    /// Sets the OOB response timeout and retry budget.
    pub fn oob(&mut self, timeout: Duration, max_retries: u8) -> Result<&mut Self> {
        self.modify(|c| {
            c.oob_timeout = timeout;
            c.max_oob_retries = max_retries;
        })
    }

    /// Sets the training timeout and the number of speed step-downs allowed.
    pub fn training(&mut self, timeout: Duration, max_retries: u8) -> Result<&mut Self> {
        self.modify(|c| {
            c.training_timeout = timeout;
            c.max_training_retries = max_retries;
        })
    }

    /// Sets the alignment threshold and the framing error budget.
    pub fn alignment(&mut self, threshold: u16, max_retries: u8) -> Result<&mut Self> {
        self.modify(|c| {
            c.align_threshold = threshold;
            c.max_align_retries = max_retries;
        })
    }

    /// Validates and freezes the configuration.
    pub fn finalize(&mut self) -> Result<Config> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized.into());
        }
        self.config.validate()?;
        self.finalized = true;
        Ok(self.config.clone())
    }
}
