use std::{fmt, str::FromStr};

use crate::error::{ConfigError, ErrorKind};

/// Link speed grade, ordered from slowest to fastest.
///
/// Negotiation only ever moves downward within a session, so the ordering is
/// what the negotiator relies on for fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SpeedGrade {
    /// 1.5 Gb/s
    Gen1,
    /// 3.0 Gb/s
    Gen2,
    /// 6.0 Gb/s
    #[default]
    Gen3,
}

impl SpeedGrade {
    /// All grades, slowest first.
    pub const ALL: [SpeedGrade; 3] = [SpeedGrade::Gen1, SpeedGrade::Gen2, SpeedGrade::Gen3];
    /// The slowest supported grade.
    pub const LOWEST: SpeedGrade = SpeedGrade::Gen1;
    /// The fastest supported grade.
    pub const HIGHEST: SpeedGrade = SpeedGrade::Gen3;

    /// Returns the next slower grade, or `None` below Gen1.
    pub fn lower(self) -> Option<SpeedGrade> {
        match self {
            SpeedGrade::Gen1 => None,
            SpeedGrade::Gen2 => Some(SpeedGrade::Gen1),
            SpeedGrade::Gen3 => Some(SpeedGrade::Gen2),
        }
    }

    /// Returns the next faster grade, or `None` above Gen3.
    pub fn higher(self) -> Option<SpeedGrade> {
        match self {
            SpeedGrade::Gen1 => Some(SpeedGrade::Gen2),
            SpeedGrade::Gen2 => Some(SpeedGrade::Gen3),
            SpeedGrade::Gen3 => None,
        }
    }

    /// Serial line rate in Mb/s.
    pub fn line_rate_mbps(self) -> u32 {
        match self {
            SpeedGrade::Gen1 => 1500,
            SpeedGrade::Gen2 => 3000,
            SpeedGrade::Gen3 => 6000,
        }
    }

    /// Generation number (1, 2 or 3).
    pub fn generation(self) -> u8 {
        match self {
            SpeedGrade::Gen1 => 1,
            SpeedGrade::Gen2 => 2,
            SpeedGrade::Gen3 => 3,
        }
    }
}

impl fmt::Display for SpeedGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen{}", self.generation())
    }
}

impl FromStr for SpeedGrade {
    type Err = ErrorKind;

    /// Accepts `gen1`..`gen3` and `sata1`..`sata3`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gen1" | "sata1" => Ok(SpeedGrade::Gen1),
            "gen2" | "sata2" => Ok(SpeedGrade::Gen2),
            "gen3" | "sata3" => Ok(SpeedGrade::Gen3),
            _ => Err(ErrorKind::Config(ConfigError::UnknownSpeedGrade(s.to_string()))),
        }
    }
}
