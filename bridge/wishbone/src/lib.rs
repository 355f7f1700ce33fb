//! Host side transport for the Wishbone bus bridge.
//!
//! Register reads and writes are framed into fixed-layout commands, batched up to the
//! capacity of a bidirectional block pipe, and sent in a single write-then-read round trip.
//! Every response is checked against the command that produced it.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate num_derive;

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

mod cmd;
mod completion;
mod config;
mod driver;
mod error;
pub mod legacy;
mod op;
mod queue;

pub use self::{
    cmd::{total_words, Command, Header, Opcode, SequenceCounter},
    completion::{Completion, FromResponse},
    config::*,
    driver::Bridge,
    error::{BusError, Error},
    op::{PendingOp, Response},
};
