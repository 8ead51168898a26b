//! Primitive and word encoding.

use byteorder::{ByteOrder, LittleEndian};

use sataphy_core::{constants::CHARS_PER_WORD, lane::Character, Word};

use super::{ALIGN_VALUE, DIAL_TONE_VALUE, IDLE_VALUE, SYNC_VALUE};

/// Link primitives carried in the character stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Alignment primitive, exchanged while training and aligning
    Align,
    /// Synchronization primitive, announces a side is ready
    Sync,
    /// Idle fill when no word is available
    Idle,
}

/// Serializes primitives and words into characters.
pub struct PrimitiveEncoder;

impl PrimitiveEncoder {
    /// Returns the control character for a primitive.
    pub fn encode(primitive: Primitive) -> Character {
        match primitive {
            Primitive::Align => Character::control(ALIGN_VALUE),
            Primitive::Sync => Character::control(SYNC_VALUE),
            Primitive::Idle => Character::control(IDLE_VALUE),
        }
    }

    /// Returns the data character the host transmits while waiting for ALIGN.
    pub fn dial_tone() -> Character {
        Character::data(DIAL_TONE_VALUE)
    }

    /// Splits a word into data characters, least significant byte first.
    pub fn pack_word(word: Word) -> [Character; CHARS_PER_WORD] {
        let mut bytes = [0u8; CHARS_PER_WORD];
        LittleEndian::write_u32(&mut bytes, word);
        bytes.map(Character::data)
    }
}
