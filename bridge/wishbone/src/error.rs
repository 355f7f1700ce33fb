use core::fmt;

/// A failure reported for a single request in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The echoed header differs from the header that was sent.
    Desync { expected: u32, actual: u32 },
    /// The echoed address differs from the last address the request touched.
    AddressMismatch { expected: u32, actual: u32 },
    /// The bus timed out while accessing `address`.
    Timeout { address: u32 },
    /// The round trip carrying the request failed before any response arrived.
    Aborted,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    Pipe(E),
    Bus(BusError),
}

impl<E> From<BusError> for Error<E> {
    fn from(value: BusError) -> Self {
        Error::Bus(value)
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desync { expected, actual } => write!(
                f,
                "Response header {actual:#010x} does not match request header {expected:#010x}"
            ),
            Self::AddressMismatch { expected, actual } => write!(
                f,
                "Response address {actual:#010x} does not match request address {expected:#010x}"
            ),
            Self::Timeout { address } => write!(f, "Bus timeout at address {address:#010x}"),
            Self::Aborted => write!(f, "Round trip aborted"),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipe(e) => write!(f, "Pipe error: {e:?}"),
            Self::Bus(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl core::error::Error for BusError {}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
