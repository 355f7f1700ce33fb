use alloc::{vec, vec::Vec};
use core::mem;

use block_pipe::BlockPipe;

use crate::{
    cmd::{Command, SequenceCounter},
    completion::{Completion, Ticket},
    op::PendingOp,
    queue::{QueuedRequest, RequestQueue},
    BridgeConfig, Error, MAX_BURST_SIZE,
};

/// Host side of the Wishbone bridge.
///
/// Operations are framed, queued, and sent to the bridge in batches. The eager operations
/// flush the queue before returning, while the `_deferred` variants return a [`Completion`]
/// so that several operations can share the latency of one round trip.
pub struct Bridge<P: BlockPipe> {
    pipe: P,
    seq: SequenceCounter,
    queue: RequestQueue,
    atomic_group: bool,
}

impl<P: BlockPipe> Bridge<P> {
    pub fn new(pipe: P) -> Self {
        Self::with_config(pipe, BridgeConfig::new())
    }

    pub fn with_config(pipe: P, config: BridgeConfig) -> Self {
        Self {
            pipe,
            seq: SequenceCounter::new(),
            queue: RequestQueue::new(config),
            atomic_group: false,
        }
    }

    /// Release the pipe.
    /// Requests that are still queued are dropped, and their completions resolve as aborted.
    pub fn release(self) -> P {
        self.pipe
    }

    pub fn config(&self) -> &BridgeConfig {
        self.queue.config()
    }

    /// Get the largest burst read that fits in a single round trip.
    pub fn max_burst_read_len(&self) -> usize {
        self.config().max_burst_read_len()
    }

    /// Get the largest burst write that fits in a single round trip.
    pub fn max_burst_write_len(&self) -> usize {
        self.config().max_burst_write_len()
    }

    /// Get the number of requests waiting for the next flush.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run `f` with the atomic-group flag set on every command it issues.
    pub fn in_transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = mem::replace(&mut self.atomic_group, true);
        let result = f(self);
        self.atomic_group = previous;
        result
    }

    /// Send all queued commands to the bridge.
    pub fn flush(&mut self) -> Result<(), Error<P::Error>> {
        self.queue.flush(&mut self.pipe)
    }

    /// Read a single register.
    pub fn read(&mut self, address: u32) -> Result<u32, Error<P::Error>> {
        self.read_deferred(address)?.get(self)
    }

    /// Queue a read of a single register.
    pub fn read_deferred(&mut self, address: u32) -> Result<Completion<u32>, Error<P::Error>> {
        let ticket = self.submit(Command::read(address))?;
        Ok(Completion::pending(ticket))
    }

    /// Write a single register.
    pub fn write(&mut self, address: u32, value: u32) -> Result<(), Error<P::Error>> {
        self.submit(Command::write(address, &value))?;
        self.flush()
    }

    /// Replace the bits selected by `mask` in a register with those of `value`.
    /// The register value before modification is returned.
    pub fn modify(&mut self, address: u32, value: u32, mask: u32) -> Result<u32, Error<P::Error>> {
        self.modify_deferred(address, value, mask)?.get(self)
    }

    /// Queue a modification of a register.
    pub fn modify_deferred(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
    ) -> Result<Completion<u32>, Error<P::Error>> {
        let ticket = self.submit(Command::modify(address, &value, mask))?;
        Ok(Completion::pending(ticket))
    }

    /// Read `size` words starting at `address`, advancing the address by `addr_incr` per word.
    ///
    /// `size` must not exceed [`Self::max_burst_read_len()`], so that the response fits in the
    /// pipe; longer reads must be split by the caller.
    pub fn burst_read(
        &mut self,
        address: u32,
        size: usize,
        addr_incr: u8,
    ) -> Result<Vec<u32>, Error<P::Error>> {
        self.burst_read_deferred(address, size, addr_incr)?.get(self)
    }

    /// Queue a burst read.
    pub fn burst_read_deferred(
        &mut self,
        address: u32,
        size: usize,
        addr_incr: u8,
    ) -> Result<Completion<Vec<u32>>, Error<P::Error>> {
        assert!(size <= MAX_BURST_SIZE);

        let ticket = match size {
            0 => return Ok(Completion::resolved(Ok(vec![]))),
            1 => self.submit(Command::read(address))?,
            _ => self.submit(Command::burst_read(address, size, addr_incr))?,
        };
        Ok(Completion::pending(ticket))
    }

    /// Write `values` starting at `address`, advancing the address by `addr_incr` per word.
    ///
    /// `values` must not hold more than [`Self::max_burst_write_len()`] words, so that the
    /// command frame fits in the pipe; longer writes must be split by the caller.
    pub fn burst_write(
        &mut self,
        address: u32,
        values: &[u32],
        addr_incr: u8,
    ) -> Result<(), Error<P::Error>> {
        assert!(
            values.len() <= self.max_burst_write_len(),
            "burst write does not fit in the pipe"
        );

        match values {
            [] => Ok(()),
            [value] => self.write(address, *value),
            values => {
                self.submit(Command::burst_write(address, values, addr_incr))?;
                self.flush()
            }
        }
    }

    fn submit(&mut self, command: Command<'_>) -> Result<Ticket, Error<P::Error>> {
        let command = command.in_group(self.atomic_group);
        let (header, frame) = command.encode(self.seq.next());

        let ticket = Ticket::new();
        let request = QueuedRequest {
            op: PendingOp::new(header, &command),
            ticket: ticket.clone(),
        };
        self.queue.enqueue(&mut self.pipe, &frame, request)?;

        Ok(ticket)
    }
}
