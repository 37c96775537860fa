//! Traits to perform in-order, serial, byte-wise I/O with the GDB client.
//!
//! On a debug probe this is typically a USB CDC-ACM endpoint or a UART; in
//! host-side tools it may be stdio or a pipe.

mod impls;

/// A trait to perform in-order, serial, byte-wise I/O.
pub trait Connection {
    /// Transport-specific error type.
    type Error;

    /// Write a single byte.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Write the entire buffer, blocking until complete.
    ///
    /// This method's default implementation calls `self.write()` on each byte
    /// in the buffer. If the transport has a more efficient bulk path (e.g: a
    /// USB endpoint taking a whole packet at once), this method should be
    /// overwritten.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        for b in buf {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Flush this Connection, ensuring that all intermediately buffered
    /// contents reach their destination.
    ///
    /// _Note:_ Not all `Connection`s have internal buffering. In these cases,
    /// it's fine to simply return `Ok(())`.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Called at the start of a debugging session _before_ any GDB packets have
    /// been sent/received.
    ///
    /// This method's default implementation is a no-op.
    fn on_session_start(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Extends [`Connection`] with `read` and `peek` methods.
///
/// The stub needs both a blocking read (while waiting for the next packet)
/// and a non-blocking peek (while the target is running, to spot a Ctrl-C
/// without stalling the halt poll).
pub trait ConnectionExt: Connection {
    /// Read a single byte.
    fn read(&mut self) -> Result<u8, Self::Error>;

    /// Peek a single byte. This MUST be a **non-blocking** operation, returning
    /// `None` if no byte is available.
    ///
    /// Returns a byte (if one is available) without removing that byte from the
    /// queue. Subsequent calls to `peek` MUST return the same byte.
    fn peek(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Peek a single byte, waiting at most `timeout_ms` milliseconds for one
    /// to arrive.
    ///
    /// Used by the No-Ack recovery heuristic, which races a stale `+` from a
    /// reconnecting client against a short timeout. The default
    /// implementation does not wait at all and simply calls `peek`.
    fn peek_timeout(&mut self, timeout_ms: u32) -> Result<Option<u8>, Self::Error> {
        let _ = timeout_ms;
        self.peek()
    }
}
