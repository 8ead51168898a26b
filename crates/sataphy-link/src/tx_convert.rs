//! TX width conversion: words to characters.

use sataphy_core::{constants::CHARS_PER_WORD, lane::Character, Word};
use sataphy_protocol::{encode, Primitive, PrimitiveEncoder};

/// Outcome of one TX tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxTick {
    /// Character to transmit
    pub character: Character,
    /// The offered word was taken
    pub accepted: bool,
}

/// Fragments words into characters, one per tick.
///
/// A word is emitted as four data characters, least significant byte first.
/// No new word is accepted until the current one has drained.
#[derive(Debug, Clone)]
pub struct TxConverter {
    characters: [Character; CHARS_PER_WORD],
    next: usize,
}

impl Default for TxConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TxConverter {
    /// Creates an idle converter.
    pub fn new() -> Self {
        Self { characters: [Character::data(0); CHARS_PER_WORD], next: 0 }
    }

    /// Returns true when no word is in flight.
    pub fn is_idle(&self) -> bool {
        self.next == 0
    }

    /// Returns true if a word offered on the next tick would be accepted.
    pub fn is_ready(&self) -> bool {
        self.is_idle()
    }

    /// Emits the next character.
    ///
    /// While a word is draining `word` is ignored and not accepted. Otherwise
    /// `word` starts a new fragment sequence, or idle fill is emitted.
    pub fn tick(&mut self, word: Option<Word>) -> TxTick {
        if !self.is_idle() {
            let character = self.characters[self.next];
            self.next = (self.next + 1) % CHARS_PER_WORD;
            return TxTick { character, accepted: false };
        }

        match word {
            Some(word) => {
                tracing::trace!("Fragmenting word {:#010x}", word);
                self.characters = PrimitiveEncoder::pack_word(word);
                self.next = 1;
                TxTick { character: self.characters[0], accepted: true }
            }
            None => TxTick { character: encode(Primitive::Idle), accepted: false },
        }
    }

    /// Drops any word in flight.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
