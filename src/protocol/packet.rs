use crate::protocol::commands::Command;
use crate::protocol::common::hex::decode_hex;

/// Packet parse error.
#[derive(Debug)]
pub enum PacketParseError {
    ChecksumMismatched { checksum: u8, calculated: u8 },
    EmptyBuf,
    MissingChecksum,
    MalformedChecksum,
    MalformedCommand,
    UnexpectedHeader(u8),
}

/// Top-Level GDB packet
pub enum Packet<'a> {
    Ack,
    Nack,
    /// Ctrl-C (`0x03`)
    Interrupt,
    /// `0x04`, sent when the host side of the port is closed
    PortClosed,
    Command(Command<'a>),
}

/// Wrapper around a byte buffer containing a GDB packet, while also tracking
/// the range of the buffer containing the packet's "body".
///
/// A newly constructed `PacketBuf` will have a body that spans the entire data
/// portion of the packet (i.e: excluding the leading '$' and trailing
/// '#checksum'), but the range can be further restricted as part of packet
/// parsing.
///
/// The body may contain binary data (`X` and `vFlashWrite` packets), so no
/// ASCII validation is performed here.
pub struct PacketBuf<'a> {
    buf: &'a mut [u8],
    body_range: core::ops::Range<usize>,
}

impl<'a> PacketBuf<'a> {
    /// Validate the contents of the raw packet buffer, checking for checksum
    /// consistency and structural correctness.
    pub fn new(pkt_buf: &'a mut [u8]) -> Result<PacketBuf<'a>, PacketParseError> {
        if pkt_buf.is_empty() {
            return Err(PacketParseError::EmptyBuf);
        }

        // the checksum trails the *last* '#', binary bodies never contain an
        // unescaped one
        let hash = pkt_buf
            .iter()
            .rposition(|b| *b == b'#')
            .ok_or(PacketParseError::MissingChecksum)?;

        let checksum = pkt_buf
            .get(hash + 1..hash + 3)
            .ok_or(PacketParseError::MalformedChecksum)?;
        let checksum = decode_hex(checksum).map_err(|_| PacketParseError::MalformedChecksum)?;

        let body = &pkt_buf[1..hash];
        let calculated = body.iter().fold(0u8, |a, x| a.wrapping_add(*x));
        if calculated != checksum {
            return Err(PacketParseError::ChecksumMismatched {
                checksum,
                calculated,
            });
        }

        Ok(PacketBuf {
            buf: pkt_buf,
            body_range: 1..hash,
        })
    }

    /// (used for tests) Create a packet buffer from a raw body buffer, skipping
    /// the header/checksum trimming stage.
    #[cfg(test)]
    pub fn new_with_raw_body(body: &'a mut [u8]) -> Result<PacketBuf<'a>, PacketParseError> {
        let len = body.len();
        Ok(PacketBuf {
            buf: body,
            body_range: 0..len,
        })
    }

    /// Strip the specified prefix from the packet buffer, returning `true` if
    /// there was a prefix match.
    pub fn strip_prefix(&mut self, prefix: &[u8]) -> bool {
        let body = &self.buf[self.body_range.clone()];
        if body.starts_with(prefix) {
            self.body_range = (self.body_range.start + prefix.len())..self.body_range.end;
            true
        } else {
            false
        }
    }

    /// Return a reference to the current body.
    pub fn as_body(&self) -> &[u8] {
        &self.buf[self.body_range.clone()]
    }

    /// Return a mut reference to slice of the packet buffer corresponding to
    /// the current body.
    pub fn into_body(self) -> &'a mut [u8] {
        &mut self.buf[self.body_range]
    }
}

impl<'a> Packet<'a> {
    pub fn from_buf(buf: &'a mut [u8]) -> Result<Packet<'a>, PacketParseError> {
        // cannot have empty packet
        if buf.is_empty() {
            return Err(PacketParseError::EmptyBuf);
        }

        match buf[0] {
            b'$' => Ok(Packet::Command(
                Command::from_packet(PacketBuf::new(buf)?)
                    .ok_or(PacketParseError::MalformedCommand)?,
            )),
            b'+' => Ok(Packet::Ack),
            b'-' => Ok(Packet::Nack),
            0x03 => Ok(Packet::Interrupt),
            0x04 => Ok(Packet::PortClosed),
            _ => Err(PacketParseError::UnexpectedHeader(buf[0])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_ok() {
        let mut raw = b"$m20000000,4#4f".to_vec();
        let buf = PacketBuf::new(&mut raw).unwrap();
        assert_eq!(buf.as_body(), b"m20000000,4");
    }

    #[test]
    fn checksum_mismatch() {
        let mut raw = b"$m20000000,4#00".to_vec();
        assert!(matches!(
            PacketBuf::new(&mut raw),
            Err(PacketParseError::ChecksumMismatched {
                checksum: 0,
                calculated: 0x4f
            })
        ));
    }

    #[test]
    fn missing_checksum() {
        let mut raw = b"$qC".to_vec();
        assert!(matches!(
            PacketBuf::new(&mut raw),
            Err(PacketParseError::MissingChecksum)
        ));
    }

    #[test]
    fn strip_prefix() {
        let mut raw = b"vFlashDone".to_vec();
        let mut buf = PacketBuf::new_with_raw_body(&mut raw).unwrap();
        assert!(!buf.strip_prefix(b"vFlashErase:"));
        assert!(buf.strip_prefix(b"vFlash"));
        assert_eq!(buf.as_body(), b"Done");
    }
}
