use alloc::{rc::Rc, vec, vec::Vec};
use core::cell::OnceCell;

use block_pipe::BlockPipe;

use crate::{op::Response, Bridge, BusError, Error};

type Outcome = Result<Response, BusError>;

/// Receives the outcome of one queued request when its batch is flushed.
#[derive(Clone, Debug, Default)]
pub struct Ticket(Rc<OnceCell<Outcome>>);

impl Ticket {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.0.get().is_some()
    }

    pub(crate) fn complete(&self, outcome: Outcome) {
        // A ticket is only ever part of one batch.
        let _ = self.0.set(outcome);
    }

    fn outcome(&self) -> Outcome {
        self.0.get().cloned().unwrap_or(Err(BusError::Aborted))
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u32 {}
    impl Sealed for alloc::vec::Vec<u32> {}
}

/// A value decoded from a verified response.
///
/// Only the value types of the bridge operations implement this trait.
pub trait FromResponse: sealed::Sealed + Sized {
    fn from_response(response: Response) -> Self;
}

impl FromResponse for u32 {
    fn from_response(response: Response) -> Self {
        match response {
            Response::Word(word) => word,
            other => panic!("Expected a single word response, got {:?}", other),
        }
    }
}

impl FromResponse for Vec<u32> {
    fn from_response(response: Response) -> Self {
        match response {
            Response::Words(words) => words,
            Response::Word(word) => vec![word],
            Response::Ack => panic!("Expected a read response"),
        }
    }
}

/// The result of an operation whose response may not have been received yet.
///
/// Completions are only handed out by the `_deferred` operations of [`Bridge`]:
///
/// ```compile_fail
/// use wishbone_bridge_driver::Completion;
///
/// let _ = Completion::<u32>::Resolved(Ok(0));
/// ```
#[derive(Clone, Debug)]
pub struct Completion<T>(State<T>);

#[derive(Clone, Debug)]
enum State<T> {
    /// The outcome is known.
    Resolved(Result<T, BusError>),
    /// The request is queued, or its batch was flushed but the outcome is not yet decoded.
    Pending(Ticket),
}

impl<T> Completion<T> {
    pub(crate) const fn resolved(outcome: Result<T, BusError>) -> Self {
        Self(State::Resolved(outcome))
    }

    pub(crate) const fn pending(ticket: Ticket) -> Self {
        Self(State::Pending(ticket))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.0, State::Resolved(_))
    }
}

impl<T: FromResponse + Clone> Completion<T> {
    /// Get the value, flushing the queue of `bridge` if the request is still queued.
    ///
    /// Only the first call can flush; the decoded outcome is cached. If the flush fails
    /// because of another request in the same batch that error is returned, and a later call
    /// returns the outcome of this request.
    pub fn get<P: BlockPipe>(&mut self, bridge: &mut Bridge<P>) -> Result<T, Error<P::Error>> {
        let outcome = match &self.0 {
            State::Resolved(outcome) => return outcome.clone().map_err(Error::Bus),
            State::Pending(ticket) => {
                if !ticket.is_complete() {
                    bridge.flush()?;
                }
                ticket.outcome().map(T::from_response)
            }
        };

        self.0 = State::Resolved(outcome.clone());
        outcome.map_err(Error::Bus)
    }
}
