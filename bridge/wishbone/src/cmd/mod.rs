mod command;
mod header;

pub use {
    command::Command,
    header::{Header, Opcode},
};

/// Number of distinct sequence tags.
pub const SEQUENCE_SPACE: usize = 256;

/// Get the number of words in a frame carrying `size` payload words.
///
/// Every frame starts with three words (header, address and mask on the way out, or header on
/// the way back in, followed by address and timeout) and is padded to the 16 byte block size
/// of the pipe.
pub const fn total_words(size: usize) -> usize {
    (size + 3).div_ceil(4) * 4
}

/// Sequence tag generator, one per bridge.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceCounter(u8);

impl SequenceCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Get the next tag, wrapping after 255.
    pub fn next(&mut self) -> u8 {
        let seq = self.0;
        self.0 = self.0.wrapping_add(1);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_words_is_block_aligned() {
        assert_eq!(4, total_words(0));
        assert_eq!(4, total_words(1));
        assert_eq!(8, total_words(2));
        assert_eq!(8, total_words(5));
        assert_eq!(12, total_words(6));
        assert_eq!(8192, total_words(8189));
        assert_eq!(8196, total_words(8191));
    }

    #[test]
    fn sequence_wraps() {
        let mut seq = SequenceCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(expected, seq.next());
        }
        assert_eq!(0, seq.next());
        assert_eq!(1, seq.next());
    }
}
