#[cfg(feature = "trace-pkt")]
use alloc::string::String;
#[cfg(feature = "trace-pkt")]
use alloc::vec::Vec;

use num_traits::PrimInt;

use crate::conn::Connection;
use crate::internal::BeBytes;

/// Newtype around a Connection error. Having a newtype allows implementing a
/// `From<ResponseWriterError<C>> for ProbeStubError<C>`, which greatly
/// simplifies error handling in the dispatcher.
#[derive(Debug, Clone)]
pub struct Error<C>(pub C);

/// A wrapper around [`Connection`] that computes the single-byte checksum of
/// outgoing data.
///
/// Nothing is written until the first byte of payload, so a `ResponseWriter`
/// which is dropped without being flushed leaves the connection untouched.
pub struct ResponseWriter<'a, C: Connection> {
    inner: &'a mut C,
    header: u8,
    started: bool,
    checksum: u8,

    // buffer to log outgoing packets. only allocates if logging is enabled.
    #[cfg(feature = "trace-pkt")]
    msg: Vec<u8>,
}

impl<'a, C: Connection + 'a> ResponseWriter<'a, C> {
    /// Creates a new ResponseWriter for a regular (`$`) packet.
    pub fn new(inner: &'a mut C) -> Self {
        Self::with_header(inner, b'$')
    }

    /// Creates a new ResponseWriter for an asynchronous (`%`) notification.
    pub fn new_notification(inner: &'a mut C) -> Self {
        Self::with_header(inner, b'%')
    }

    fn with_header(inner: &'a mut C, header: u8) -> Self {
        Self {
            inner,
            header,
            started: false,
            checksum: 0,

            #[cfg(feature = "trace-pkt")]
            msg: Vec::new(),
        }
    }

    /// Consumes self, writing out the final '#' and checksum
    pub fn flush(mut self) -> Result<(), Error<C::Error>> {
        // an empty response is still a packet
        if !self.started {
            self.started = true;
            self.inner.write(self.header).map_err(Error)?;
        }

        // don't include the '#' in checksum calculation
        let checksum = self.checksum;
        self.inner.write(b'#').map_err(Error)?;
        for c in hex_digits(checksum, b'a') {
            self.inner.write(c).map_err(Error)?;
        }

        #[cfg(feature = "trace-pkt")]
        trace!(
            "--> {}{}",
            self.header as char,
            String::from_utf8_lossy(&self.msg)
        );

        self.inner.flush().map_err(Error)?;

        Ok(())
    }

    /// Get a mutable reference to the underlying connection.
    pub fn as_conn(&mut self) -> &mut C {
        self.inner
    }

    fn write(&mut self, byte: u8) -> Result<(), Error<C::Error>> {
        #[cfg(feature = "trace-pkt")]
        if log_enabled!(log::Level::Trace) {
            self.msg.push(byte)
        }

        if !self.started {
            self.started = true;
            self.inner.write(self.header).map_err(Error)?;
        }

        self.checksum = self.checksum.wrapping_add(byte);
        self.inner.write(byte).map_err(Error)
    }

    /// Write an entire string over the connection.
    pub fn write_str(&mut self, s: &str) -> Result<(), Error<C::Error>> {
        for b in s.as_bytes().iter() {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Write a single byte as a lowercase hex string (two ascii chars)
    fn write_hex(&mut self, byte: u8) -> Result<(), Error<C::Error>> {
        for c in hex_digits(byte, b'a') {
            self.write(c)?;
        }
        Ok(())
    }

    /// Write a byte-buffer as a hex string (i.e: two ascii chars / byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) -> Result<(), Error<C::Error>> {
        for b in data.iter() {
            self.write_hex(*b)?;
        }
        Ok(())
    }

    /// Write a one-letter reply code followed by a byte in uppercase hex, as
    /// used by error (`E01`), stop (`T05`), exit (`W00`) and termination
    /// (`X1D`) replies.
    pub fn write_code(&mut self, letter: u8, code: u8) -> Result<(), Error<C::Error>> {
        self.write(letter)?;
        for c in hex_digits(code, b'A') {
            self.write(c)?;
        }
        Ok(())
    }

    /// Write data using the binary protocol.
    pub fn write_binary(&mut self, data: &[u8]) -> Result<(), Error<C::Error>> {
        for &b in data.iter() {
            match b {
                b'#' | b'$' | b'}' | b'*' => {
                    self.write(b'}')?;
                    self.write(b ^ 0x20)?
                }
                _ => self.write(b)?,
            }
        }
        Ok(())
    }

    /// Write a number as a big-endian hex string using the most compact
    /// representation possible (i.e: trimming leading zeros).
    pub fn write_num<D: BeBytes + PrimInt>(&mut self, digit: D) -> Result<(), Error<C::Error>> {
        if digit.is_zero() {
            return self.write(b'0');
        }

        let mut buf = [0; 16];
        let len = match digit.to_be_bytes(&mut buf) {
            Some(len) => len,
            None => return Ok(()),
        };
        let mut digits = buf[..len]
            .iter()
            .flat_map(|&b| hex_digits(b, b'a'))
            .skip_while(|&c| c == b'0');
        for c in &mut digits {
            self.write(c)?;
        }
        Ok(())
    }

    /// Write a number as a zero-padded, fixed width (8 digit) hex string.
    pub fn write_addr(&mut self, addr: u32) -> Result<(), Error<C::Error>> {
        self.write_hex_buf(&addr.to_be_bytes())
    }
}

fn hex_digits(byte: u8, alpha: u8) -> [u8; 2] {
    let digit = |d: u8| match d {
        0..=9 => b'0' + d,
        _ => alpha + d - 10,
    };
    [digit(byte >> 4), digit(byte & 0x0f)]
}
