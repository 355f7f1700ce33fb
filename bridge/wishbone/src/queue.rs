//! Request batching and response demultiplexing.

use alloc::{vec, vec::Vec};
use core::mem;

use block_pipe::BlockPipe;

use crate::{
    cmd::SEQUENCE_SPACE, completion::Ticket, op::PendingOp, BridgeConfig, BusError, Error,
};

pub struct QueuedRequest {
    pub op: PendingOp,
    pub ticket: Ticket,
}

/// Commands waiting for the next round trip.
pub struct RequestQueue {
    config: BridgeConfig,
    output: Vec<u8>,
    expected_len: usize,
    requests: Vec<QueuedRequest>,
}

impl RequestQueue {
    pub fn new(config: BridgeConfig) -> Self {
        config.validate();

        Self {
            config,
            output: Vec::new(),
            expected_len: 0,
            requests: Vec::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Get the number of bytes that the next flush writes.
    #[cfg(test)]
    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    /// Get the number of bytes that the next flush reads.
    #[cfg(test)]
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// Queue an encoded command, flushing first if it would not fit in the current batch.
    pub fn enqueue<P: BlockPipe>(
        &mut self,
        pipe: &mut P,
        frame: &[u8],
        request: QueuedRequest,
    ) -> Result<(), Error<P::Error>> {
        let response_len = request.op.response_len();
        assert!(
            frame.len() <= self.config.max_fifo_size
                && response_len <= self.config.max_fifo_size,
            "request does not fit in the pipe"
        );

        if self.needs_flush(frame.len(), response_len) {
            self.flush(pipe)?;
        }

        assert!(!self.needs_flush(frame.len(), response_len));
        trace!(
            "Queued {:#x} with {} bytes out and {} bytes in",
            request.op.header().0,
            frame.len(),
            response_len
        );

        self.output.extend_from_slice(frame);
        self.expected_len += response_len;
        self.requests.push(request);

        Ok(())
    }

    /// Send all queued commands in one round trip and deliver their responses.
    ///
    /// Every request is completed before the first error is returned, and the queue is
    /// always empty afterwards.
    pub fn flush<P: BlockPipe>(&mut self, pipe: &mut P) -> Result<(), Error<P::Error>> {
        if self.is_empty() {
            return Ok(());
        }

        let output = mem::take(&mut self.output);
        let expected_len = mem::replace(&mut self.expected_len, 0);
        let requests = mem::take(&mut self.requests);

        assert!(output.len() <= self.config.max_fifo_size);
        assert!(expected_len <= self.config.max_fifo_size);

        debug!(
            "Flushing {} requests with {} bytes out and {} bytes in",
            requests.len(),
            output.len(),
            expected_len
        );

        let mut response = vec![0; expected_len];
        if let Err(e) = self.round_trip(pipe, &output, &mut response) {
            error!("Round trip of {} requests failed", requests.len());
            for request in &requests {
                request.ticket.complete(Err(BusError::Aborted));
            }
            return Err(Error::Pipe(e));
        }

        demultiplex(&requests, &response)?;
        Ok(())
    }

    fn needs_flush(&self, frame_len: usize, response_len: usize) -> bool {
        self.output.len() + frame_len > self.config.max_fifo_size
            || self.expected_len + response_len > self.config.max_fifo_size
            || self.requests.len() >= SEQUENCE_SPACE
    }

    fn round_trip<P: BlockPipe>(
        &self,
        pipe: &mut P,
        output: &[u8],
        response: &mut [u8],
    ) -> Result<(), P::Error> {
        pipe.write_block(self.config.in_endpoint, self.config.block_size, output)?;
        pipe.read_block(self.config.out_endpoint, self.config.block_size, response)?;
        Ok(())
    }
}

/// Split `response` into consecutive frames of the given lengths.
pub fn split_frames<'a, I>(response: &'a [u8], lengths: I) -> impl Iterator<Item = &'a [u8]>
where
    I: IntoIterator<Item = usize>,
{
    let mut offset = 0;
    lengths.into_iter().map(move |len| {
        let frame = &response[offset..offset + len];
        offset += len;
        frame
    })
}

/// Hand every request its frame of `response`, in queue order.
///
/// All requests are completed even if some fail verification; the first failure is returned.
pub fn demultiplex(requests: &[QueuedRequest], response: &[u8]) -> Result<(), BusError> {
    let frames = split_frames(response, requests.iter().map(|r| r.op.response_len()));

    let mut first_error = None;
    for (request, frame) in requests.iter().zip(frames) {
        let outcome = request.op.complete(frame);
        if let Err(e) = outcome {
            warn!("Request {:#x} failed: {}", request.op.header().0, e);
            first_error.get_or_insert(e);
        }
        request.ticket.complete(outcome);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
