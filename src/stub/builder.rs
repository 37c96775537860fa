use core::fmt::{self, Display};

use alloc::boxed::Box;
use alloc::vec;

use managed::ManagedSlice;

use crate::conn::ConnectionExt;
use crate::registry::TargetRegistry;
use crate::session::Session;
use crate::ConsoleOutput;

use super::core_impl::ProbeStubImpl;
use super::{MonitorHandler, ProbeStub};

/// Default packet buffer size, advertised to GDB as `PacketSize`.
pub const DEFAULT_PACKET_BUFFER_SIZE: usize = 1024;

/// Default time to wait for a stale acknowledgment after `qSupported`.
pub const DEFAULT_NO_ACK_TIMEOUT_MS: u32 = 100;

// Room for the longest stop reply, and a useful `m` reply.
const MIN_PACKET_BUFFER_SIZE: usize = 64;

/// An error which may occur when building a [`ProbeStub`].
#[derive(Debug)]
pub enum ProbeStubBuilderError {
    /// Custom packet buffer size is larger than the provided buffer's length.
    PacketBufSizeMismatch,
    /// The packet buffer cannot hold the stub's own replies.
    PacketBufTooSmall,
}

impl Display for ProbeStubBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::ProbeStubBuilderError::*;
        match self {
            PacketBufSizeMismatch => write!(
                f,
                "`packet_buffer_size` is larger than `with_packet_buffer`'s size."
            ),
            PacketBufTooSmall => write!(
                f,
                "packet buffer must be at least {} bytes.",
                MIN_PACKET_BUFFER_SIZE
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProbeStubBuilderError {}

/// Helper to construct and customize [`ProbeStub`].
pub struct ProbeStubBuilder<'a, C: ConnectionExt> {
    conn: C,
    packet_buffer: Option<&'a mut [u8]>,
    packet_buffer_size: Option<usize>,
    no_ack_timeout_ms: u32,
    monitor: Option<MonitorHandler>,
}

impl<'a, C: ConnectionExt> ProbeStubBuilder<'a, C> {
    /// Create a new `ProbeStubBuilder` using the provided Connection.
    pub fn new(conn: C) -> ProbeStubBuilder<'static, C> {
        ProbeStubBuilder {
            conn,
            packet_buffer: None,
            packet_buffer_size: None,
            no_ack_timeout_ms: DEFAULT_NO_ACK_TIMEOUT_MS,
            monitor: None,
        }
    }

    /// Use a pre-allocated packet buffer (instead of heap-allocating).
    pub fn with_packet_buffer(mut self, packet_buffer: &'a mut [u8]) -> Self {
        self.packet_buffer = Some(packet_buffer);
        self
    }

    /// Specify a custom size for the packet buffer. Defaults to 1024 bytes.
    ///
    /// When used alongside `with_packet_buffer`, the provided `size` must be
    /// less than or equal to the length of the packet buffer.
    pub fn packet_buffer_size(mut self, size: usize) -> Self {
        self.packet_buffer_size = Some(size);
        self
    }

    /// How long to wait for a stale `+` after answering `qSupported` while
    /// No-Ack mode is active. Defaults to 100ms.
    ///
    /// A GDB which reconnects after an unclean disconnect doesn't know the
    /// previous session negotiated No-Ack mode, and will acknowledge the
    /// `qSupported` reply. Seeing that acknowledgment switches the stub back
    /// to acknowledging packets.
    pub fn no_ack_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.no_ack_timeout_ms = timeout_ms;
        self
    }

    /// Handle `monitor` commands before they reach the current target.
    ///
    /// The handler returns `None` for commands it doesn't recognize (which
    /// are then passed on to the target's
    /// [`MonitorCmd`](crate::target::ext::monitor_cmd::MonitorCmd)
    /// extension), or whether the command succeeded.
    pub fn monitor_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut TargetRegistry, &mut Session, &[u8], ConsoleOutput<'_>) -> Option<bool>
            + 'static,
    {
        self.monitor = Some(Box::new(handler));
        self
    }

    /// Build the ProbeStub, returning an error if something went wrong.
    pub fn build(self) -> Result<ProbeStub<'a, C>, ProbeStubBuilderError> {
        let packet_buffer = match self.packet_buffer {
            Some(buf) => {
                let buf = match self.packet_buffer_size {
                    Some(custom_len) => {
                        if custom_len > buf.len() {
                            return Err(ProbeStubBuilderError::PacketBufSizeMismatch);
                        } else {
                            &mut buf[..custom_len]
                        }
                    }
                    None => buf,
                };
                ManagedSlice::Borrowed(buf)
            }
            None => {
                let len = self
                    .packet_buffer_size
                    .unwrap_or(DEFAULT_PACKET_BUFFER_SIZE);
                ManagedSlice::Owned(vec![0; len])
            }
        };

        if packet_buffer.len() < MIN_PACKET_BUFFER_SIZE {
            return Err(ProbeStubBuilderError::PacketBufTooSmall);
        }

        let mut inner = ProbeStubImpl::new(packet_buffer.len(), self.no_ack_timeout_ms);
        if let Some(handler) = self.monitor {
            inner.set_monitor_handler(handler);
        }

        Ok(ProbeStub {
            conn: self.conn,
            packet_buffer,
            inner,
        })
    }
}
