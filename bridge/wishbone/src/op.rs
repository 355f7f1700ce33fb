//! Pending operations and verification of their response frames.

use alloc::vec::Vec;

use crate::{
    cmd::{total_words, Command, Header, Opcode},
    BusError,
};

/// Length in bytes of every response frame, except the one of a burst read.
pub const SINGLE_RESPONSE_LEN: usize = 16;

/// The decoded payload of a verified response frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Ack,
    Word(u32),
    Words(Vec<u32>),
}

/// A queued operation, carrying what is needed to verify and decode its response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOp {
    Read {
        header: Header,
        address: u32,
    },
    Write {
        header: Header,
        address: u32,
    },
    Modify {
        header: Header,
        address: u32,
    },
    BurstRead {
        header: Header,
        address: u32,
        size: usize,
        addr_incr: u8,
    },
    BurstWrite {
        header: Header,
        address: u32,
        size: usize,
        addr_incr: u8,
    },
}

impl PendingOp {
    pub fn new(header: Header, command: &Command<'_>) -> Self {
        let address = command.address;
        let size = command.size;
        let addr_incr = command.addr_incr;
        match command.opcode {
            Opcode::Read if size > 1 => PendingOp::BurstRead {
                header,
                address,
                size,
                addr_incr,
            },
            Opcode::Read => PendingOp::Read { header, address },
            Opcode::Write if size > 1 => PendingOp::BurstWrite {
                header,
                address,
                size,
                addr_incr,
            },
            Opcode::Write => PendingOp::Write { header, address },
            Opcode::Modify => PendingOp::Modify { header, address },
        }
    }

    /// Get the length of the response frame in bytes.
    pub const fn response_len(&self) -> usize {
        match *self {
            PendingOp::BurstRead { size, .. } => total_words(size) * 4,
            _ => SINGLE_RESPONSE_LEN,
        }
    }

    pub const fn header(&self) -> Header {
        match *self {
            PendingOp::Read { header, .. }
            | PendingOp::Write { header, .. }
            | PendingOp::Modify { header, .. }
            | PendingOp::BurstRead { header, .. }
            | PendingOp::BurstWrite { header, .. } => header,
        }
    }

    /// Get the address the bridge echoes, i.e. the last address touched.
    pub fn expected_address(&self) -> u32 {
        match *self {
            PendingOp::Read { address, .. }
            | PendingOp::Write { address, .. }
            | PendingOp::Modify { address, .. } => address,
            PendingOp::BurstRead {
                address,
                size,
                addr_incr,
                ..
            }
            | PendingOp::BurstWrite {
                address,
                size,
                addr_incr,
                ..
            } => {
                let stride = (size.saturating_sub(1) as u32).wrapping_mul(addr_incr as u32);
                address.wrapping_add(stride)
            }
        }
    }

    /// Verify and decode the response frame of this operation.
    ///
    /// The frame is `[header, data..., address, timeout]`.
    pub fn complete(&self, frame: &[u8]) -> Result<Response, BusError> {
        assert_eq!(self.response_len(), frame.len());

        let words: Vec<u32> = frame
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        let echoed_header = words[0];
        let echoed_address = words[words.len() - 2];
        let timeout = words[words.len() - 1];

        let header = self.header();
        if echoed_header != header.0 {
            return Err(BusError::Desync {
                expected: header.0,
                actual: echoed_header,
            });
        }

        if timeout != 0 {
            return Err(BusError::Timeout {
                address: echoed_address,
            });
        }

        let expected_address = self.expected_address();
        if echoed_address != expected_address {
            return Err(BusError::AddressMismatch {
                expected: expected_address,
                actual: echoed_address,
            });
        }

        Ok(match *self {
            PendingOp::Read { .. } | PendingOp::Modify { .. } => Response::Word(words[1]),
            PendingOp::Write { .. } | PendingOp::BurstWrite { .. } => Response::Ack,
            PendingOp::BurstRead { size, .. } => Response::Words(words[1..=size].to_vec()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn frame(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|word| word.to_le_bytes()).collect()
    }

    fn write_op(seq: u8, address: u32) -> PendingOp {
        let value = 0xCAFE_BABE;
        let command = Command::write(address, &value);
        let (header, _) = command.encode(seq);
        PendingOp::new(header, &command)
    }

    #[test]
    fn write_is_acknowledged() {
        // Given
        let op = write_op(9, 0x1000);
        let header = op.header().0;

        // When
        let response = op.complete(&frame(&[header, 0xCAFE_BABE, 0x1000, 0]));

        // Then
        assert_eq!(Ok(Response::Ack), response);
    }

    #[test]
    fn write_timeout_carries_address() {
        // Given
        let op = write_op(9, 0x1000);
        let header = op.header().0;

        // When
        let response = op.complete(&frame(&[header, 0xCAFE_BABE, 0x1000, 1]));

        // Then
        assert_eq!(Err(BusError::Timeout { address: 0x1000 }), response);
    }

    #[test]
    fn header_mismatch_is_desync() {
        // Given
        let op = write_op(9, 0x1000);
        let header = op.header().0;
        let other = write_op(10, 0x1000).header().0;

        // When
        let response = op.complete(&frame(&[other, 0, 0x1000, 0]));

        // Then
        assert_eq!(
            Err(BusError::Desync {
                expected: header,
                actual: other
            }),
            response
        );
    }

    #[test]
    fn address_mismatch() {
        // Given
        let op = write_op(9, 0x1000);
        let header = op.header().0;

        // When
        let response = op.complete(&frame(&[header, 0, 0x1004, 0]));

        // Then
        assert_eq!(
            Err(BusError::AddressMismatch {
                expected: 0x1000,
                actual: 0x1004
            }),
            response
        );
    }

    #[test]
    fn burst_read_decodes_words_and_strides_address() {
        // Given
        let command = Command::burst_read(0x100, 5, 4);
        let (header, _) = command.encode(0);
        let op = PendingOp::new(header, &command);

        // When
        let response = op.complete(&frame(&[header.0, 10, 11, 12, 13, 14, 0x110, 0]));

        // Then
        assert_eq!(32, op.response_len());
        assert_eq!(Ok(Response::Words(vec![10, 11, 12, 13, 14])), response);
    }

    #[test]
    fn burst_read_skips_padding() {
        // Given
        let command = Command::burst_read(0x100, 2, 0);
        let (header, _) = command.encode(0);
        let op = PendingOp::new(header, &command);

        // When
        let response = op.complete(&frame(&[
            header.0,
            20,
            21,
            0xDEAD_BEEF,
            0xDEAD_BEEF,
            0xDEAD_BEEF,
            0x100,
            0,
        ]));

        // Then
        assert_eq!(Ok(Response::Words(vec![20, 21])), response);
    }

    #[test]
    fn burst_write_expects_last_address() {
        // Given
        let values = [1, 2, 3];
        let command = Command::burst_write(0x200, &values, 8);
        let (header, _) = command.encode(0);
        let op = PendingOp::new(header, &command);

        // When
        let response = op.complete(&frame(&[header.0, 0, 0x210, 0]));

        // Then
        assert_eq!(SINGLE_RESPONSE_LEN, op.response_len());
        assert_eq!(Ok(Response::Ack), response);
    }

    #[test]
    fn modify_returns_previous_value() {
        // Given
        let value = 1;
        let command = Command::modify(0x30, &value, 0x1);
        let (header, _) = command.encode(0);
        let op = PendingOp::new(header, &command);

        // When
        let response = op.complete(&frame(&[header.0, 0x0000_0100, 0x30, 0]));

        // Then
        assert_eq!(Ok(Response::Word(0x100)), response);
    }
}
