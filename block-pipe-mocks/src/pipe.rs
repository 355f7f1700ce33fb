use block_pipe::ErrorKind;
use mockall::{mock, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeError;

impl block_pipe::Error for PipeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

mock! {
    #[derive(Debug)]
    pub BlockPipe {}

    impl block_pipe::BlockPipe for BlockPipe {
        fn write_block(&mut self, endpoint: u8, block_size: usize, data: &[u8]) -> Result<(), PipeError>;
        fn read_block(&mut self, endpoint: u8, block_size: usize, buffer: &mut [u8]) -> Result<(), PipeError>;
    }

    impl block_pipe::ErrorType for BlockPipe {
        type Error = PipeError;
    }
}

impl MockBlockPipe {
    /// Expect one write of exactly `expected` to `in_endpoint`, followed by one read of
    /// `response.len()` bytes from `out_endpoint` that is answered with `response`.
    pub fn expect_round_trip(
        &mut self,
        seq: &mut Sequence,
        in_endpoint: u8,
        out_endpoint: u8,
        expected: Vec<u8>,
        response: Vec<u8>,
    ) {
        self.expect_write_block()
            .withf(move |endpoint, _, data| *endpoint == in_endpoint && data.to_vec() == expected)
            .times(1)
            .in_sequence(seq)
            .returning(|_, _, _| Ok(()));

        let len = response.len();
        self.expect_read_block()
            .withf(move |endpoint, _, buffer| *endpoint == out_endpoint && buffer.len() == len)
            .times(1)
            .in_sequence(seq)
            .returning(move |_, _, buffer| {
                buffer.copy_from_slice(&response);
                Ok(())
            });
    }

    /// Expect one write to `in_endpoint` of any content, failing with `PipeError`.
    pub fn expect_failed_write(&mut self, seq: &mut Sequence, in_endpoint: u8) {
        self.expect_write_block()
            .withf(move |endpoint, _, _| *endpoint == in_endpoint)
            .times(1)
            .in_sequence(seq)
            .returning(|_, _, _| Err(PipeError));
    }
}
