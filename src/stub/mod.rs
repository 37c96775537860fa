//! The core [`ProbeStub`] type, used to serve a GDB debugging session for the
//! targets of a [`TargetRegistry`] over a given [`Connection`].
//!
//! [`Connection`]: crate::conn::Connection

use alloc::boxed::Box;
use alloc::vec;

use managed::ManagedSlice;

use crate::conn::ConnectionExt;
use crate::registry::TargetRegistry;
use crate::session::Session;
use crate::ConsoleOutput;

mod builder;
mod core_impl;
mod error;
mod stop_reason;

pub use builder::{
    ProbeStubBuilder, ProbeStubBuilderError, DEFAULT_NO_ACK_TIMEOUT_MS, DEFAULT_PACKET_BUFFER_SIZE,
};
pub use error::ProbeStubError;

use ProbeStubError as Error;

/// Stub-level handler for `monitor` commands.
///
/// See [`ProbeStubBuilder::monitor_handler`].
pub type MonitorHandler =
    Box<dyn FnMut(&mut TargetRegistry, &mut Session, &[u8], ConsoleOutput<'_>) -> Option<bool>>;

/// Serve GDB Remote Serial Protocol requests over a given connection.
///
/// The stub talks to whichever target of the [`TargetRegistry`] GDB has
/// attached to (via `vAttach`). Only one target is attached at a time.
pub struct ProbeStub<'a, C: ConnectionExt> {
    conn: C,
    packet_buffer: ManagedSlice<'a, u8>,
    inner: core_impl::ProbeStubImpl<C>,
}

impl<'a, C: ConnectionExt> ProbeStub<'a, C> {
    /// Create a [`ProbeStubBuilder`] using the provided Connection.
    pub fn builder(conn: C) -> ProbeStubBuilder<'a, C> {
        ProbeStubBuilder::new(conn)
    }

    /// Create a new `ProbeStub` using the provided connection, and a heap
    /// allocated packet buffer of the default size.
    ///
    /// For fine-grained control over various `ProbeStub` options, use the
    /// [`ProbeStub::builder`] method instead.
    pub fn new(conn: C) -> ProbeStub<'a, C> {
        ProbeStub {
            conn,
            packet_buffer: ManagedSlice::Owned(vec![0; DEFAULT_PACKET_BUFFER_SIZE]),
            inner: core_impl::ProbeStubImpl::new(
                DEFAULT_PACKET_BUFFER_SIZE,
                DEFAULT_NO_ACK_TIMEOUT_MS,
            ),
        }
    }

    /// The debugging session's state.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Borrow the underlying connection.
    pub fn borrow_conn(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Serve GDB requests until the connection fails.
    ///
    /// Target faults never end the session: the fault is reported to GDB as
    /// `EFF`, every target in `registry` is destroyed, and the stub goes back
    /// to waiting for packets. GDB closing its end of the port (`0x04`)
    /// merely detaches the current target.
    pub fn run_blocking(&mut self, registry: &mut TargetRegistry) -> ProbeStubError<C::Error> {
        if let Err(e) = self.conn.on_session_start() {
            return Error::ConnectionInit(e);
        }

        loop {
            let res = self
                .inner
                .pump(&mut self.conn, &mut self.packet_buffer, registry);

            let err = match res {
                Ok(()) => continue,
                Err(e) if e.is_connection_error() => return e,
                Err(e) => e,
            };

            if let Err(e) = self.inner.recover(&mut self.conn, registry, err) {
                return e;
            }
        }
    }
}
