use crate::cmd::total_words;

/// Pipe endpoint receiving command frames.
pub const ADDR_WBBRIDGE_IN: u8 = 0x83;
/// Pipe endpoint producing response frames.
pub const ADDR_WBBRIDGE_OUT: u8 = 0xA4;
/// Transfer granularity of both pipe endpoints in bytes.
pub const BLOCK_SIZE: usize = 16;
/// Bytes that may be in flight in either direction for one flush.
/// The pipe holds 2048 words, but it is throttled by its programmable-full flag.
pub const MAX_FIFO_SIZE: usize = (2 * 1024 - 300) * 4;
/// Largest burst the 13 bit size field can express.
pub const MAX_BURST_SIZE: usize = 8191;
/// Filler for unused mask words and frame padding.
pub const DEFAULT_MASK: u32 = 0xDEAD_BEEF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    pub in_endpoint: u8,
    pub out_endpoint: u8,
    pub block_size: usize,
    pub max_fifo_size: usize,
}

impl BridgeConfig {
    pub const fn new() -> Self {
        Self {
            in_endpoint: ADDR_WBBRIDGE_IN,
            out_endpoint: ADDR_WBBRIDGE_OUT,
            block_size: BLOCK_SIZE,
            max_fifo_size: MAX_FIFO_SIZE,
        }
    }

    /// Get the largest burst read whose response fits in a single flush.
    pub const fn max_burst_read_len(&self) -> usize {
        let words = self.max_fifo_size / 4 / 4 * 4;
        let len = words.saturating_sub(3);
        if len < MAX_BURST_SIZE {
            len
        } else {
            MAX_BURST_SIZE
        }
    }

    /// Get the largest burst write whose command frame fits in a single flush.
    pub const fn max_burst_write_len(&self) -> usize {
        // A burst write frame has the same length as a burst read response.
        self.max_burst_read_len()
    }

    pub(crate) fn validate(&self) {
        // Every frame is a whole number of 16 byte blocks.
        assert!(self.block_size > 0 && BLOCK_SIZE % self.block_size == 0);
        assert!(self.max_fifo_size > 0 && self.max_fifo_size % self.block_size == 0);
        assert!(total_words(1) * 4 <= self.max_fifo_size);
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}
