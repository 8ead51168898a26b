//! Character classification and word reassembly.

use byteorder::{ByteOrder, LittleEndian};

use sataphy_core::{constants::CHARS_PER_WORD, lane::Character, Word};

use super::{encoder::Primitive, ALIGN_VALUE, IDLE_VALUE, SYNC_VALUE};

/// Classification of one received character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Payload byte
    Data(u8),
    /// ALIGN primitive
    Align,
    /// SYNC primitive
    Sync,
    /// Idle fill primitive
    Idle,
    /// Control character with no defined meaning; never treated as data
    Unknown(u8),
}

impl CharClass {
    /// Returns the primitive this class stands for, if any.
    pub fn primitive(self) -> Option<Primitive> {
        match self {
            CharClass::Align => Some(Primitive::Align),
            CharClass::Sync => Some(Primitive::Sync),
            CharClass::Idle => Some(Primitive::Idle),
            CharClass::Data(_) | CharClass::Unknown(_) => None,
        }
    }

    /// Returns true for the defined primitives.
    pub fn is_primitive(self) -> bool {
        self.primitive().is_some()
    }

    /// Returns true for payload characters.
    pub fn is_data(self) -> bool {
        matches!(self, CharClass::Data(_))
    }

    /// Returns true for undefined control characters.
    pub fn is_unknown(self) -> bool {
        matches!(self, CharClass::Unknown(_))
    }
}

impl From<Primitive> for CharClass {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Align => CharClass::Align,
            Primitive::Sync => CharClass::Sync,
            Primitive::Idle => CharClass::Idle,
        }
    }
}

/// Classifies characters received from the transceiver.
pub struct PrimitiveDecoder;

impl PrimitiveDecoder {
    /// Classifies a single character.
    pub fn classify(character: Character) -> CharClass {
        if !character.control {
            return CharClass::Data(character.value);
        }
        match character.value {
            ALIGN_VALUE => CharClass::Align,
            SYNC_VALUE => CharClass::Sync,
            IDLE_VALUE => CharClass::Idle,
            other => CharClass::Unknown(other),
        }
    }

    /// Reassembles a word from data bytes, least significant byte first.
    pub fn unpack_word(bytes: &[u8; CHARS_PER_WORD]) -> Word {
        LittleEndian::read_u32(bytes)
    }
}
