use bitfield::bitfield;
use num_traits::FromPrimitive;

use crate::MAX_BURST_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Read one word, or a burst of words.
    Read = 0,
    /// Write one word, or a burst of words.
    Write = 1,
    /// Read-modify-write of the bits selected by the mask.
    Modify = 2,
}

bitfield! {
    /// The first word of every command frame, echoed unchanged as the first word of its response.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Header(u32);
    impl Debug;
    u8, opcode_bits, set_opcode_bits: 1, 0;
    /// Number of words in the burst.
    pub u16, size, set_size: 14, 2;
    /// Sequence tag.
    pub u8, seq, set_seq: 22, 15;
    /// Keep the bus locked between this command and the next one.
    pub atomic_group, set_atomic_group: 23;
    /// Address increment between the words of a burst.
    pub u8, addr_incr, set_addr_incr: 31, 24;
}

impl Header {
    pub fn new(opcode: Opcode, size: usize, seq: u8, atomic_group: bool, addr_incr: u8) -> Self {
        assert!(size <= MAX_BURST_SIZE, "size is 13 bit");

        let mut header = Header(0);
        header.set_opcode_bits(opcode as u8);
        header.set_size(size as u16);
        header.set_seq(seq);
        header.set_atomic_group(atomic_group);
        header.set_addr_incr(addr_incr);
        header
    }

    /// Get the operation, or None for the reserved encoding.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode_bits())
    }
}

impl From<u32> for Header {
    fn from(value: u32) -> Self {
        Header(value)
    }
}

impl From<Header> for u32 {
    fn from(value: Header) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_write() {
        let header = Header::new(Opcode::Write, 1, 0x5A, false, 0);
        assert_eq!(1 | (1 << 2) | (0x5A << 15), header.0);
    }

    #[test]
    fn all_fields() {
        let header = Header::new(Opcode::Modify, 8191, 0xFF, true, 0xFF);
        assert_eq!(0xFFFF_FFFE, header.0);

        assert_eq!(Some(Opcode::Modify), header.opcode());
        assert_eq!(8191, header.size());
        assert_eq!(0xFF, header.seq());
        assert!(header.atomic_group());
        assert_eq!(0xFF, header.addr_incr());
    }

    #[test]
    fn reserved_opcode() {
        assert_eq!(None, Header(0b11).opcode());
    }

    #[test]
    #[should_panic]
    fn size_is_13_bit() {
        Header::new(Opcode::Read, 8192, 0, false, 0);
    }
}
