//! RX width conversion: characters to words.
//!
//! Data characters accumulate least significant byte first until a word is
//! complete. The word is then held as the converter's output until upstream
//! acknowledges it; while it is held and unacknowledged the converter stalls
//! and leaves the incoming character unconsumed.
//!
//! Primitives are never word content. A primitive, an undefined control
//! character or a missing character mid-word discards the partial word, so
//! bytes from either side of a gap are never merged. After a gap, or a data
//! character dropped while stalled, data is skipped until the next primitive.

use sataphy_core::{constants::CHARS_PER_WORD, lane::Character, Word};
use sataphy_protocol::{classify, CharClass, PrimitiveDecoder};

/// Outcome of one RX tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxTick {
    /// Classification of the input character, reported even when stalled
    pub class: Option<CharClass>,
    /// The held word was not acknowledged, so the input was not consumed
    pub stalled: bool,
    /// A partial word was thrown away
    pub discarded: bool,
}

impl RxTick {
    /// Returns true if a data character was left unconsumed.
    pub fn dropped_data(&self) -> bool {
        self.stalled && self.class.is_some_and(CharClass::is_data)
    }
}

/// Assembles words from the received character stream.
#[derive(Debug, Clone, Default)]
pub struct RxConverter {
    bytes: [u8; CHARS_PER_WORD],
    filled: usize,
    held: Option<Word>,
    /// Data is skipped until the next non-data character
    resync: bool,
}

impl RxConverter {
    /// Creates an empty converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The word offered upstream, if one is complete.
    pub fn source(&self) -> Option<Word> {
        self.held
    }

    /// Returns true while a partial word is being assembled.
    pub fn is_assembling(&self) -> bool {
        self.filled > 0
    }

    /// Advances one tick.
    ///
    /// `ack` acknowledges the word returned by [`source`](Self::source) before
    /// this tick. `deliver` enables assembly; when false characters are only
    /// classified.
    pub fn tick(&mut self, input: Option<Character>, ack: bool, deliver: bool) -> RxTick {
        let stalled = self.held.is_some() && !ack;
        let class = input.map(classify);
        let mut result = RxTick { class, stalled, discarded: false };

        if stalled {
            if result.dropped_data() {
                // The dropped byte belongs to the next word; realign at the next primitive.
                self.resync = true;
            }
            return result;
        }
        if ack {
            self.held = None;
        }

        match class {
            Some(CharClass::Data(byte)) if deliver && !self.resync => {
                self.bytes[self.filled] = byte;
                self.filled += 1;
                if self.filled == CHARS_PER_WORD {
                    let word = PrimitiveDecoder::unpack_word(&self.bytes);
                    tracing::trace!("Assembled word {:#010x}", word);
                    self.held = Some(word);
                    self.filled = 0;
                }
            }
            Some(CharClass::Data(_)) => {}
            other => {
                // Only a primitive marks a word boundary; after a gap the rest of the
                // broken word is skipped.
                self.resync = !other.is_some_and(CharClass::is_primitive);
                if self.filled > 0 {
                    tracing::trace!("Discarding partial word of {} byte(s)", self.filled);
                    self.filled = 0;
                    result.discarded = true;
                }
            }
        }
        result
    }

    /// Discards the partial and held words.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sataphy_protocol::{encode, Primitive, PrimitiveEncoder};

    fn feed_word(rx: &mut RxConverter, word: Word) {
        for character in PrimitiveEncoder::pack_word(word) {
            let tick = rx.tick(Some(character), false, true);
            assert!(!tick.stalled);
        }
    }

    #[test]
    fn test_assembles_little_endian_word() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 0x1234_5678);
        assert_eq!(rx.source(), Some(0x1234_5678));
    }

    #[test]
    fn test_primitives_are_not_word_content() {
        let mut rx = RxConverter::new();
        let idle = encode(Primitive::Idle);
        rx.tick(Some(idle), false, true);
        rx.tick(Some(idle), false, true);
        feed_word(&mut rx, 7);
        assert_eq!(rx.source(), Some(7));
    }

    #[test]
    fn test_unknown_mid_word_discards_partial() {
        let mut rx = RxConverter::new();
        let first = PrimitiveEncoder::pack_word(0xAAAA_AAAA);
        rx.tick(Some(first[0]), false, true);
        rx.tick(Some(first[1]), false, true);

        let tick = rx.tick(Some(Character::control(0x55)), false, true);
        assert_eq!(tick.class, Some(CharClass::Unknown(0x55)));
        assert!(tick.discarded);
        assert!(!rx.is_assembling());

        // The tail of the broken word is skipped, not stitched onto the next one.
        rx.tick(Some(first[3]), false, true);
        feed_word(&mut rx, 0x0102_0304);
        assert_eq!(rx.source(), None);

        rx.tick(Some(encode(Primitive::Align)), false, true);
        feed_word(&mut rx, 0x0102_0304);
        assert_eq!(rx.source(), Some(0x0102_0304));
    }

    #[test]
    fn test_missing_character_mid_word_discards_partial() {
        let mut rx = RxConverter::new();
        rx.tick(Some(Character::data(1)), false, true);
        let tick = rx.tick(None, false, true);
        assert!(tick.discarded);
        assert_eq!(tick.class, None);
    }

    #[test]
    fn test_stall_holds_word_for_exactly_the_unacked_ticks() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 42);
        let idle = encode(Primitive::Idle);

        for _ in 0..5 {
            let tick = rx.tick(Some(idle), false, true);
            assert!(tick.stalled);
            assert_eq!(rx.source(), Some(42));
        }

        let tick = rx.tick(Some(idle), true, true);
        assert!(!tick.stalled);
        assert_eq!(rx.source(), None);
    }

    #[test]
    fn test_never_two_words_without_ack() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 1);
        for character in PrimitiveEncoder::pack_word(2) {
            let tick = rx.tick(Some(character), false, true);
            assert!(tick.stalled);
            assert!(tick.dropped_data());
        }
        assert_eq!(rx.source(), Some(1));
    }

    #[test]
    fn test_ack_frees_slot_in_same_tick() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 1);
        let second = PrimitiveEncoder::pack_word(2);
        rx.tick(Some(second[0]), true, true);
        for &character in &second[1..] {
            rx.tick(Some(character), false, true);
        }
        assert_eq!(rx.source(), Some(2));
    }

    #[test]
    fn test_resyncs_after_dropped_data() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 1);
        let second = PrimitiveEncoder::pack_word(2);
        rx.tick(Some(second[0]), false, true);
        // Acknowledged mid-word: the tail of the broken word is skipped.
        rx.tick(Some(second[1]), true, true);
        rx.tick(Some(second[2]), false, true);
        rx.tick(Some(second[3]), false, true);
        assert_eq!(rx.source(), None);

        rx.tick(Some(encode(Primitive::Idle)), false, true);
        feed_word(&mut rx, 3);
        assert_eq!(rx.source(), Some(3));
    }

    #[test]
    fn test_no_assembly_while_not_delivering() {
        let mut rx = RxConverter::new();
        for character in PrimitiveEncoder::pack_word(9) {
            let tick = rx.tick(Some(character), false, false);
            assert!(tick.class.is_some_and(CharClass::is_data));
        }
        assert_eq!(rx.source(), None);
        assert!(!rx.is_assembling());
    }

    #[test]
    fn test_reset_discards_partial_and_held() {
        let mut rx = RxConverter::new();
        feed_word(&mut rx, 5);
        rx.tick(Some(Character::data(1)), true, true);
        rx.reset();
        assert_eq!(rx.source(), None);
        assert!(!rx.is_assembling());
    }
}
