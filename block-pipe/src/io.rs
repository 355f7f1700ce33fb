//! Adapter from a blocking byte stream to a block pipe.
//!
//! Bridges that are reached over a plain serial link (UART, USB CDC, a socket) have no
//! notion of endpoints: the command stream is written as-is and the response stream is
//! read back as-is. Endpoint ids are ignored.

use embedded_io::{Read, ReadExactError, Write};

use crate::{BlockPipe, ErrorKind, ErrorType};

/// A [`BlockPipe`] on top of an [`embedded_io`] stream.
pub struct IoPipe<T> {
    io: T,
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoPipeError<E> {
    /// The stream ended before the whole response was read.
    UnexpectedEof,
    Io(E),
}

impl<T> IoPipe<T> {
    pub const fn new(io: T) -> Self {
        Self { io }
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<E: embedded_io::Error> crate::Error for IoPipeError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            IoPipeError::UnexpectedEof => ErrorKind::ShortTransfer,
            IoPipeError::Io(e) => match e.kind() {
                embedded_io::ErrorKind::TimedOut => ErrorKind::Timeout,
                embedded_io::ErrorKind::NotConnected
                | embedded_io::ErrorKind::ConnectionReset
                | embedded_io::ErrorKind::BrokenPipe => ErrorKind::Disconnected,
                _ => ErrorKind::Other,
            },
        }
    }
}

impl<E> From<ReadExactError<E>> for IoPipeError<E> {
    fn from(value: ReadExactError<E>) -> Self {
        match value {
            ReadExactError::UnexpectedEof => IoPipeError::UnexpectedEof,
            ReadExactError::Other(e) => IoPipeError::Io(e),
        }
    }
}

impl<T: Read + Write> ErrorType for IoPipe<T> {
    type Error = IoPipeError<T::Error>;
}

impl<T: Read + Write> BlockPipe for IoPipe<T> {
    fn write_block(
        &mut self,
        _endpoint: u8,
        block_size: usize,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        assert_eq!(0, data.len() % block_size);

        self.io.write_all(data).map_err(IoPipeError::Io)?;
        self.io.flush().map_err(IoPipeError::Io)?;
        Ok(())
    }

    fn read_block(
        &mut self,
        _endpoint: u8,
        block_size: usize,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        assert_eq!(0, buffer.len() % block_size);

        self.io.read_exact(buffer)?;
        Ok(())
    }
}
