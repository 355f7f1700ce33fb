//! Blocking block-pipe traits.
//!
//! A block pipe is a pair of endpoints that move whole blocks of bytes between the host and
//! a device: one endpoint accepts writes, the other produces reads. Transfers are exact-size,
//! synchronous, and preserve byte order.
#![cfg_attr(not(test), no_std)]

#[cfg(feature = "io")]
pub mod io;

/// Pipe error.
pub trait Error: core::fmt::Debug {
    /// Convert error to a generic pipe error kind.
    fn kind(&self) -> ErrorKind;
}

impl Error for core::convert::Infallible {
    fn kind(&self) -> ErrorKind {
        match *self {}
    }
}

/// Pipe error kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum ErrorKind {
    /// The device is no longer reachable.
    Disconnected,
    /// The device did not complete the transfer in time.
    Timeout,
    /// Fewer bytes were transferred than requested.
    ShortTransfer,
    /// A different error occurred.
    Other,
}

impl Error for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Device disconnected"),
            Self::Timeout => write!(f, "Transfer timed out"),
            Self::ShortTransfer => write!(f, "Transfer was cut short"),
            Self::Other => write!(f, "A different error occurred"),
        }
    }
}

/// Pipe error type trait.
pub trait ErrorType {
    type Error: Error;
}

impl<T: ErrorType + ?Sized> ErrorType for &mut T {
    type Error = T::Error;
}

/// A bidirectional block pipe.
pub trait BlockPipe: ErrorType {
    /// Write all of `data` to the `endpoint` input pipe.
    ///
    /// `data.len()` is a multiple of `block_size`.
    fn write_block(&mut self, endpoint: u8, block_size: usize, data: &[u8])
        -> Result<(), Self::Error>;

    /// Fill all of `buffer` from the `endpoint` output pipe.
    ///
    /// `buffer.len()` is a multiple of `block_size`.
    fn read_block(
        &mut self,
        endpoint: u8,
        block_size: usize,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<T: BlockPipe + ?Sized> BlockPipe for &mut T {
    fn write_block(
        &mut self,
        endpoint: u8,
        block_size: usize,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        T::write_block(self, endpoint, block_size, data)
    }

    fn read_block(
        &mut self,
        endpoint: u8,
        block_size: usize,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::read_block(self, endpoint, block_size, buffer)
    }
}
