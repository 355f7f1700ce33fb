//! The first generation block-throttled pipe bridge.
//!
//! This bridge has no sequence tags, bursts or response verification. Each transaction
//! occupies an 8 byte slot: the value to write followed by the address, whose most
//! significant bit selects a write. A chunk of `2 * block_count` slots is written and the
//! same number of slots is read back in one round trip.

use alloc::vec;

use block_pipe::BlockPipe;

use crate::{ADDR_WBBRIDGE_IN, ADDR_WBBRIDGE_OUT};

const SLOT_SIZE: usize = 8;
const WRITE_FLAG: u32 = 1 << 31;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transaction {
    pub address: u32,
    pub access: Access,
    read_value: Option<u32>,
    fulfilled: bool,
}

impl Transaction {
    pub const fn read(address: u32) -> Self {
        Self {
            address,
            access: Access::Read,
            read_value: None,
            fulfilled: false,
        }
    }

    pub const fn write(address: u32, value: u32) -> Self {
        Self {
            address,
            access: Access::Write(value),
            read_value: None,
            fulfilled: false,
        }
    }

    pub const fn is_fulfilled(&self) -> bool {
        self.fulfilled
    }

    /// Get the value of a fulfilled read.
    pub const fn read_value(&self) -> Option<u32> {
        self.read_value
    }

    fn assign(&self, slot: &mut [u8]) {
        let (value, address) = match self.access {
            Access::Read => (0, self.address & !WRITE_FLAG),
            Access::Write(value) => (value, self.address | WRITE_FLAG),
        };
        slot[0..4].copy_from_slice(&value.to_le_bytes());
        slot[4..8].copy_from_slice(&address.to_le_bytes());
    }
}

pub struct LegacyBridge<P: BlockPipe> {
    pipe: P,
    block_count: usize,
}

impl<P: BlockPipe> LegacyBridge<P> {
    pub const DEFAULT_BLOCK_COUNT: usize = 4;

    pub fn new(pipe: P) -> Self {
        Self::with_block_count(pipe, Self::DEFAULT_BLOCK_COUNT)
    }

    pub fn with_block_count(pipe: P, block_count: usize) -> Self {
        assert!(block_count > 0);
        Self { pipe, block_count }
    }

    pub fn release(self) -> P {
        self.pipe
    }

    /// Get the number of transactions sent per round trip.
    pub const fn bulk_chunk_size(&self) -> usize {
        2 * self.block_count
    }

    pub fn read(&mut self, address: u32) -> Result<u32, P::Error> {
        let mut txn = [Transaction::read(address)];
        self.bulk_process(&mut txn)?;
        assert!(txn[0].is_fulfilled());
        Ok(txn[0].read_value.unwrap_or_default())
    }

    pub fn write(&mut self, address: u32, value: u32) -> Result<(), P::Error> {
        let mut txn = [Transaction::write(address, value)];
        self.bulk_process(&mut txn)?;
        assert!(txn[0].is_fulfilled());
        Ok(())
    }

    /// Process transactions in chunks of [`Self::bulk_chunk_size()`].
    /// Transactions of a chunk that failed are left unfulfilled.
    pub fn bulk_process(&mut self, txns: &mut [Transaction]) -> Result<(), P::Error> {
        let len = 16 * self.block_count;
        let mut data_in = vec![0; len];
        let mut data_out = vec![0; len];

        for chunk in txns.chunks_mut(self.bulk_chunk_size()) {
            data_in.fill(0);
            for (txn, slot) in chunk.iter().zip(data_in.chunks_exact_mut(SLOT_SIZE)) {
                txn.assign(slot);
            }

            self.pipe.write_block(ADDR_WBBRIDGE_IN, len, &data_in)?;
            self.pipe.read_block(ADDR_WBBRIDGE_OUT, len, &mut data_out)?;

            for (txn, slot) in chunk.iter_mut().zip(data_out.chunks_exact(SLOT_SIZE)) {
                if txn.access == Access::Read {
                    // Only the lower 24 bits are returned.
                    txn.read_value = Some(u32::from_le_bytes([slot[0], slot[1], slot[2], 0]));
                }
                txn.fulfilled = true;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use block_pipe_mocks::pipe::{MockBlockPipe, PipeError};
    use mockall::Sequence;

    use super::*;

    fn slot(value: u32, address: u32) -> [u8; 8] {
        let mut slot = [0; 8];
        slot[0..4].copy_from_slice(&value.to_le_bytes());
        slot[4..8].copy_from_slice(&address.to_le_bytes());
        slot
    }

    #[test]
    fn read() {
        // Given
        let mut seq = Sequence::new();
        let mut pipe = MockBlockPipe::new();

        let mut expected = vec![0; 64];
        expected[0..8].copy_from_slice(&slot(0, 0x0000_1234));
        let mut response = vec![0; 64];
        response[0..4].copy_from_slice(&0xFF12_3456u32.to_le_bytes());
        pipe.expect_round_trip(&mut seq, 0x83, 0xA4, expected, response);

        // When
        let mut bridge = LegacyBridge::new(pipe);
        let value = bridge.read(0x8000_1234).unwrap();

        // Then
        assert_eq!(0x0012_3456, value);
    }

    #[test]
    fn write_sets_write_flag() {
        // Given
        let mut seq = Sequence::new();
        let mut pipe = MockBlockPipe::new();

        let mut expected = vec![0; 64];
        expected[0..8].copy_from_slice(&slot(0xCAFE_BABE, 0x8000_0010));
        pipe.expect_round_trip(&mut seq, 0x83, 0xA4, expected, vec![0; 64]);

        // When
        let mut bridge = LegacyBridge::new(pipe);

        // Then
        bridge.write(0x10, 0xCAFE_BABE).unwrap();
    }

    #[test]
    fn bulk_process_in_chunks() {
        // Given
        let mut seq = Sequence::new();
        let mut pipe = MockBlockPipe::new();

        let mut first = vec![0; 32];
        let mut first_response = vec![0; 32];
        for i in 0..4 {
            first[i * 8..i * 8 + 8].copy_from_slice(&slot(0, i as u32 * 4));
            first_response[i * 8] = i as u8 + 1;
        }
        pipe.expect_round_trip(&mut seq, 0x83, 0xA4, first, first_response);

        let mut second = vec![0; 32];
        second[0..8].copy_from_slice(&slot(0, 16));
        let mut second_response = vec![0; 32];
        second_response[0] = 5;
        pipe.expect_round_trip(&mut seq, 0x83, 0xA4, second, second_response);

        let mut txns: Vec<Transaction> = (0..5).map(|i| Transaction::read(i * 4)).collect();

        // When
        let mut bridge = LegacyBridge::with_block_count(pipe, 2);
        bridge.bulk_process(&mut txns).unwrap();

        // Then
        assert_eq!(4, bridge.bulk_chunk_size());
        let values: Vec<_> = txns.iter().map(|txn| txn.read_value()).collect();
        assert_eq!(vec![Some(1), Some(2), Some(3), Some(4), Some(5)], values);
        assert!(txns.iter().all(Transaction::is_fulfilled));
    }

    #[test]
    fn failed_chunk_is_not_fulfilled() {
        // Given
        let mut seq = Sequence::new();
        let mut pipe = MockBlockPipe::new();
        pipe.expect_failed_write(&mut seq, 0x83);

        // When
        let mut bridge = LegacyBridge::new(pipe);
        let mut txns = [Transaction::write(0, 1)];
        let result = bridge.bulk_process(&mut txns);

        // Then
        assert_eq!(Err(PipeError), result);
        assert!(!txns[0].is_fulfilled());
    }
}
