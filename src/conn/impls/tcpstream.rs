use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::conn::{Connection, ConnectionExt};

// Host-side tools (simulators, probe bridges) serve GDB over TCP.
impl Connection for TcpStream {
    type Error = io::Error;

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        Write::write_all(self, &[byte])
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(self)
    }

    fn on_session_start(&mut self) -> Result<(), Self::Error> {
        // packets are tiny, don't let Nagle sit on them
        self.set_nodelay(true)
    }
}

impl ConnectionExt for TcpStream {
    fn read(&mut self) -> Result<u8, Self::Error> {
        self.set_nonblocking(false)?;
        self.set_read_timeout(None)?;

        let mut buf = [0u8];
        Read::read_exact(self, &mut buf)?;
        Ok(buf[0])
    }

    fn peek(&mut self) -> Result<Option<u8>, Self::Error> {
        self.set_nonblocking(true)?;

        let mut buf = [0u8];
        match TcpStream::peek(self, &mut buf) {
            Ok(0) => Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn peek_timeout(&mut self, timeout_ms: u32) -> Result<Option<u8>, Self::Error> {
        if timeout_ms == 0 {
            return ConnectionExt::peek(self);
        }

        self.set_nonblocking(false)?;
        self.set_read_timeout(Some(Duration::from_millis(timeout_ms.into())))?;

        let mut buf = [0u8];
        let res = match TcpStream::peek(self, &mut buf) {
            Ok(0) => Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(_) => Ok(Some(buf[0])),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        };
        self.set_read_timeout(None)?;
        res
    }
}
