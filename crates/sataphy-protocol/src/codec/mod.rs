//! Primitive codec.
//!
//! Recognizes and emits the protocol primitives carried in the character
//! stream, and packs internal words into characters. Everything here is a
//! pure function of its input.
//!
//! # Encodings
//!
//! | kind    | control | value            |
//! |---------|---------|------------------|
//! | ALIGN   | yes     | `0xBC` (K28.5)   |
//! | SYNC    | yes     | `0x7C` (K28.3)   |
//! | IDLE    | yes     | `0x3C` (K28.1)   |
//! | data    | no      | any              |
//! | unknown | yes     | any other value  |
//!
//! Both roles use the same table, which is all interoperation requires.
//!
//! # Module Organization
//!
//! - [`encoder`] - primitive and word encoding to characters
//! - [`decoder`] - character classification and word reassembly

pub mod decoder;
pub mod encoder;


pub use decoder::{CharClass, PrimitiveDecoder};
pub use encoder::{Primitive, PrimitiveEncoder};

use sataphy_core::lane::Character;

/// Control value of the ALIGN primitive (K28.5).
pub const ALIGN_VALUE: u8 = 0xBC;
/// Control value of the SYNC primitive (K28.3).
pub const SYNC_VALUE: u8 = 0x7C;
/// Control value of the idle fill primitive (K28.1).
pub const IDLE_VALUE: u8 = 0x3C;
/// Data value of the host training dial tone (D10.2).
pub const DIAL_TONE_VALUE: u8 = 0x4A;

/// Classifies a character.
#[inline]
pub fn classify(character: Character) -> CharClass {
    PrimitiveDecoder::classify(character)
}

/// Encodes a primitive as a character.
#[inline]
pub fn encode(primitive: Primitive) -> Character {
    PrimitiveEncoder::encode(primitive)
}
