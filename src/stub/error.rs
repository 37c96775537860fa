use core::fmt::{self, Debug, Display};

use crate::protocol::{PacketParseError, ResponseWriterError};
use crate::util::managed_vec::CapacityError;

/// An error which may occur during a GDB debugging session.
///
/// Only connection errors are ever returned from
/// [`ProbeStub::run_blocking`](super::ProbeStub::run_blocking). Everything
/// else is recovered from inside the stub, either at the packet boundary or by
/// tearing down every target and returning to the idle state.
#[derive(Debug)]
#[non_exhaustive]
pub enum ProbeStubError<C> {
    /// Connection Error while initializing the session.
    ConnectionInit(C),
    /// Connection Error while reading request.
    ConnectionRead(C),
    /// Connection Error while writing response.
    ConnectionWrite(C),

    /// Packet cannot fit in the provided packet buffer.
    PacketBufferOverflow,
    /// Could not parse the packet into a valid command.
    PacketParse(PacketParseError),
    /// A command which requires an attached target was received while no
    /// target was attached.
    NoTarget,
    /// A chip driver reported an unrecoverable fault.
    TargetFault(&'static str),

    // Internal - A non-fatal error occurred (with errno-style error code)
    //
    // This "dummy" error is required as part of the internal
    // `TargetResultExt::handle_error()` machinery, and will never be
    // propagated up to the end user.
    #[doc(hidden)]
    NonFatalError(u8),
}

impl<C> ProbeStubError<C> {
    /// Whether the error came from the underlying connection, and therefore
    /// ends the session.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ProbeStubError::ConnectionInit(_)
                | ProbeStubError::ConnectionRead(_)
                | ProbeStubError::ConnectionWrite(_)
        )
    }
}

impl<C> From<ResponseWriterError<C>> for ProbeStubError<C> {
    fn from(e: ResponseWriterError<C>) -> Self {
        ProbeStubError::ConnectionWrite(e.0)
    }
}

impl<A, C> From<CapacityError<A>> for ProbeStubError<C> {
    fn from(_: CapacityError<A>) -> Self {
        ProbeStubError::PacketBufferOverflow
    }
}

impl<C> Display for ProbeStubError<C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::ProbeStubError::*;
        match self {
            ConnectionInit(e) => write!(f, "Connection Error while initializing the session: {:?}", e),
            ConnectionRead(e) => write!(f, "Connection Error while reading request: {:?}", e),
            ConnectionWrite(e) => write!(f, "Connection Error while writing response: {:?}", e),
            PacketBufferOverflow => write!(f, "Packet too big for provided buffer!"),
            PacketParse(e) => write!(f, "Could not parse the packet into a valid command: {:?}", e),
            NoTarget => write!(f, "No target attached."),
            TargetFault(e) => write!(f, "Target threw a fatal error: {}", e),

            NonFatalError(_) => write!(f, "Internal non-fatal error. End users should never see this!"),
        }
    }
}

#[cfg(feature = "std")]
impl<C> std::error::Error for ProbeStubError<C> where C: Debug {}
