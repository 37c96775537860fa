//! A GDB Remote Serial Protocol engine and target-control core for in-circuit
//! debug probes.
//!
//! `probestub` sits between a GDB client and the chip drivers of a debug
//! probe. It owns the protocol side of a debugging session (packet framing,
//! dispatch, No-Ack negotiation, stop replies, semihosting File-I/O
//! forwarding) and the bookkeeping every probe needs regardless of the chip
//! being debugged:
//!
//! - a [`TargetRegistry`](registry::TargetRegistry) of discovered chips, with
//!   attach / detach / destroy lifecycle tracking,
//! - a per-target [breakpoint/watchpoint unit table](breakwatch),
//! - a [flash transaction sequencer](flash) driving erase / buffered write /
//!   commit across the target's flash regions.
//!
//! Chip drivers implement the [`Target`](target::Target) trait (plus any of
//! the optional extensions under [`target::ext`]), and describe their flash
//! banks with [`FlashDriver`](flash::FlashDriver) implementations.
//!
//! ## Getting started
//!
//! 1. Implement [`Connection`](conn::Connection) and
//!    [`ConnectionExt`](conn::ConnectionExt) for the transport carrying GDB
//!    traffic (USB CDC-ACM, a UART, stdio...).
//! 2. Implement [`Target`](target::Target) for each supported chip family.
//! 3. Populate a [`TargetRegistry`](registry::TargetRegistry) with the
//!    targets found on the debug port.
//! 4. Build a [`ProbeStub`](stub::ProbeStub) and call
//!    [`run_blocking`](stub::ProbeStub::run_blocking).
//!
//! ## Feature flags
//!
//! - `std` (default): `std::error::Error` impls for the crate's error types.
//! - `trace-pkt` (default): log every packet sent or received at the `trace`
//!   level.
//!
//! `probestub` requires `alloc`, but is otherwise `#![no_std]` compatible.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate log;

mod protocol;
mod util;

#[doc(hidden)]
pub mod internal;

pub mod breakwatch;
pub mod common;
pub mod conn;
pub mod flash;
pub mod registry;
pub mod semihosting;
pub mod session;
pub mod stub;
pub mod target;

pub use protocol::ConsoleOutput;

/// Address on the target's memory bus.
pub type TargetAddr = u32;

/// The only thread ID ever reported to the GDB client.
///
/// Debug probes expose a single core per session, but recent GDB versions
/// refuse to work without a thread to talk about.
pub const SINGLE_THREAD_TID: usize = 1;
