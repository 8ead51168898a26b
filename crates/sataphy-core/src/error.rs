use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Wrapped result type for link core operations.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Enum with all possible errors that can occur in the link core.
///
/// Only construction and configuration return errors. Runtime link faults are
/// state-machine transitions; `Link` exists so they can be reported through
/// the same type once retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration was rejected
    Config(ConfigError),
    /// A link fault that exhausted its retries
    Link(LinkError),
}

impl Display for ErrorKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config(e) => write!(fmt, "Invalid configuration: {}", e),
            ErrorKind::Link(e) => write!(fmt, "Link failure: {}", e),
        }
    }
}

impl Error for ErrorKind {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ErrorKind::Config(e) => Some(e),
            ErrorKind::Link(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ErrorKind {
    fn from(inner: ConfigError) -> Self {
        ErrorKind::Config(inner)
    }
}

impl From<LinkError> for ErrorKind {
    fn from(inner: LinkError) -> Self {
        ErrorKind::Link(inner)
    }
}

/// Errors raised while building or validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The reference clock frequency was zero
    ZeroClockFrequency,
    /// A timing parameter was zero; carries the field name
    ZeroDuration(&'static str),
    /// The alignment threshold was zero
    ZeroAlignThreshold,
    /// A set-once configuration was modified after it was finalized
    AlreadyFinalized,
    /// A speed grade name could not be parsed
    UnknownSpeedGrade(String),
}

impl Display for ConfigError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroClockFrequency => {
                write!(fmt, "reference clock frequency must be non-zero")
            }
            ConfigError::ZeroDuration(field) => write!(fmt, "`{}` must be non-zero", field),
            ConfigError::ZeroAlignThreshold => write!(fmt, "alignment threshold must be non-zero"),
            ConfigError::AlreadyFinalized => {
                write!(fmt, "configuration is already finalized and cannot be changed")
            }
            ConfigError::UnknownSpeedGrade(name) => write!(fmt, "unknown speed grade `{}`", name),
        }
    }
}

impl Error for ConfigError {}

/// Link fault kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkError {
    /// The partner did not answer an OOB burst in time
    OobTimeout,
    /// Training at a speed grade failed
    TrainingFailure,
    /// An unexpected primitive/data sequence while aligning or ready
    FramingError,
    /// A received character could not be consumed because upstream withheld acknowledgment
    Overrun,
}

impl Display for LinkError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::OobTimeout => write!(fmt, "no OOB response from link partner"),
            LinkError::TrainingFailure => write!(fmt, "speed training failed at every grade"),
            LinkError::FramingError => write!(fmt, "character stream lost alignment"),
            LinkError::Overrun => write!(fmt, "received word was not acknowledged in time"),
        }
    }
}

impl Error for LinkError {}
