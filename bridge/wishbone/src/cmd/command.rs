use alloc::vec::Vec;
use core::slice;

use crate::DEFAULT_MASK;

use super::{total_words, Header, Opcode};

/// One logical bus operation, ready to be framed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Command<'a> {
    pub opcode: Opcode,
    pub address: u32,
    pub size: usize,
    pub addr_incr: u8,
    pub atomic_group: bool,
    pub mask: u32,
    pub payload: &'a [u32],
}

impl<'a> Command<'a> {
    pub const fn read(address: u32) -> Self {
        Self {
            opcode: Opcode::Read,
            address,
            size: 1,
            addr_incr: 0,
            atomic_group: false,
            mask: DEFAULT_MASK,
            payload: &[],
        }
    }

    pub const fn write(address: u32, value: &'a u32) -> Self {
        Self {
            opcode: Opcode::Write,
            payload: slice::from_ref(value),
            ..Self::read(address)
        }
    }

    pub const fn modify(address: u32, value: &'a u32, mask: u32) -> Self {
        Self {
            opcode: Opcode::Modify,
            mask,
            payload: slice::from_ref(value),
            ..Self::read(address)
        }
    }

    pub const fn burst_read(address: u32, size: usize, addr_incr: u8) -> Self {
        Self {
            size,
            addr_incr,
            ..Self::read(address)
        }
    }

    pub const fn burst_write(address: u32, values: &'a [u32], addr_incr: u8) -> Self {
        Self {
            opcode: Opcode::Write,
            size: values.len(),
            addr_incr,
            payload: values,
            ..Self::read(address)
        }
    }

    pub const fn in_group(self, atomic_group: bool) -> Self {
        Self {
            atomic_group,
            ..self
        }
    }

    /// Get the length of the command frame in bytes.
    pub const fn len(&self) -> usize {
        if self.has_single_data_word() {
            16
        } else {
            total_words(self.size) * 4
        }
    }

    /// Frame the command using the sequence tag `seq`.
    ///
    /// The frame is `[header, address, mask]` followed by either one data word, or by all
    /// payload words and mask-valued padding up to the next multiple of four words.
    pub fn encode(&self, seq: u8) -> (Header, Vec<u8>) {
        let header = Header::new(
            self.opcode,
            self.size,
            seq,
            self.atomic_group,
            self.addr_incr,
        );

        let mut words = Vec::with_capacity(self.len() / 4);
        words.extend_from_slice(&[header.0, self.address, self.mask]);
        if self.has_single_data_word() {
            assert!(self.payload.len() <= 1);
            words.push(self.payload.first().copied().unwrap_or(0));
        } else {
            assert_eq!(self.size, self.payload.len());
            words.extend_from_slice(self.payload);
            words.resize(total_words(self.size), self.mask);
        }

        let mut frame = Vec::with_capacity(words.len() * 4);
        for word in words {
            frame.extend_from_slice(&word.to_le_bytes());
        }

        (header, frame)
    }

    const fn has_single_data_word(&self) -> bool {
        matches!(self.opcode, Opcode::Read) || self.size <= 1
    }
}

#[cfg(test)]
mod tests {
    use assert_hex::assert_eq_hex;

    use super::*;

    fn words(frame: &[u8]) -> Vec<u32> {
        frame
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn write() {
        let value = 0xCAFE_BABE;
        let (header, frame) = Command::write(0x1000, &value).encode(7);

        let expected_header = 1 | (1 << 2) | (7 << 15);
        assert_eq_hex!(expected_header, header.0);
        assert_eq_hex!(
            vec![expected_header, 0x1000, 0xDEAD_BEEF, 0xCAFE_BABE],
            words(&frame)
        );
    }

    #[test]
    fn read() {
        let (header, frame) = Command::read(0x8000_6000).encode(0);

        assert_eq!(Some(Opcode::Read), header.opcode());
        assert_eq_hex!(
            vec![header.0, 0x8000_6000, 0xDEAD_BEEF, 0x0000_0000],
            words(&frame)
        );
    }

    #[test]
    fn modify() {
        let value = 0x0000_0010;
        let (header, frame) = Command::modify(0x20, &value, 0x0000_00F0).encode(3);

        assert_eq!(Some(Opcode::Modify), header.opcode());
        assert_eq_hex!(vec![header.0, 0x20, 0xF0, 0x10], words(&frame));
    }

    #[test]
    fn burst_read_has_no_payload() {
        let (header, frame) = Command::burst_read(0x100, 300, 4).encode(1);

        assert_eq!(300, header.size());
        assert_eq!(4, header.addr_incr());
        assert_eq!(16, frame.len());
    }

    #[test]
    fn burst_write_is_padded() {
        let values = [1, 2, 3, 4, 5, 6];
        let command = Command::burst_write(0x100, &values, 1);
        let (header, frame) = command.encode(2);

        assert_eq!(48, command.len());
        assert_eq_hex!(
            vec![
                header.0,
                0x100,
                0xDEAD_BEEF,
                1,
                2,
                3,
                4,
                5,
                6,
                0xDEAD_BEEF,
                0xDEAD_BEEF,
                0xDEAD_BEEF
            ],
            words(&frame)
        );
    }

    #[test]
    fn burst_write_without_padding() {
        let values = [1, 2, 3, 4, 5];
        let (_, frame) = Command::burst_write(0x100, &values, 1).encode(2);

        assert_eq!(32, frame.len());
    }

    #[test]
    fn group_flag() {
        let (header, _) = Command::read(0).in_group(true).encode(0);

        assert!(header.atomic_group());
        assert_eq_hex!(1 << 23 | 1 << 2, header.0);
    }
}
