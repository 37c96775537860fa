use crate::util::managed_vec::{CapacityError, ManagedVec};

pub enum RecvPacketError<C> {
    Capacity,
    Connection(C),
}

impl<C> From<CapacityError<u8>> for RecvPacketError<C> {
    fn from(_: CapacityError<u8>) -> Self {
        RecvPacketError::Capacity
    }
}

/// Receives a packet by pulling data from a callback (typically backed by a
/// blocking `Connection::read`).
///
/// Bytes which cannot start a packet are skipped. Single-byte packets (`+`,
/// `-`, `0x03`, `0x04`) are returned as-is.
pub struct RecvPacketBlocking {}

impl RecvPacketBlocking {
    pub fn new() -> Self {
        RecvPacketBlocking {}
    }

    pub fn recv<'b, C>(
        &mut self,
        packet_buffer: &'b mut [u8],
        mut get_byte: impl FnMut() -> Result<u8, C>,
    ) -> Result<&'b mut [u8], RecvPacketError<C>> {
        let header_byte = loop {
            let b = get_byte().map_err(RecvPacketError::Connection)?;
            match b {
                b'$' | b'+' | b'-' | 0x03 | 0x04 => break b,
                other => trace!("discarding stray byte {:#04x}", other),
            }
        };

        let mut buf = ManagedVec::new(packet_buffer);

        buf.clear();
        buf.push(header_byte)?;
        if header_byte == b'$' {
            let mut overflow = false;
            // read the packet body
            loop {
                let c = get_byte().map_err(RecvPacketError::Connection)?;
                if !overflow && buf.push(c).is_err() {
                    overflow = true;
                }
                if c == b'#' {
                    break;
                }
            }
            // read the checksum as well
            for _ in 0..2 {
                let c = get_byte().map_err(RecvPacketError::Connection)?;
                if !overflow && buf.push(c).is_err() {
                    overflow = true;
                }
            }

            if overflow {
                error!("packet does not fit in the {} byte packet buffer", buf.len());
                return Err(RecvPacketError::Capacity);
            }
        }

        #[cfg(feature = "trace-pkt")]
        trace!(
            "<-- {}",
            alloc::string::String::from_utf8_lossy(buf.as_slice())
        );

        Ok(buf.into_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(input: &[u8], capacity: usize) -> Result<Vec<u8>, RecvPacketError<()>> {
        let mut data = input.iter().copied();
        let mut buf = vec![0; capacity];
        let mut recv = RecvPacketBlocking::new();
        recv.recv(&mut buf, || data.next().ok_or(()))
            .map(|pkt| pkt.to_vec())
    }

    #[test]
    fn command_packet() {
        let pkt = feed(b"$qC#b4", 64).ok().unwrap();
        assert_eq!(pkt, b"$qC#b4");
    }

    #[test]
    fn skips_junk_before_header() {
        let pkt = feed(b"\r\nxy+", 64).ok().unwrap();
        assert_eq!(pkt, b"+");
    }

    #[test]
    fn interrupt_byte() {
        let pkt = feed(b"\x03", 64).ok().unwrap();
        assert_eq!(pkt, b"\x03");
    }

    #[test]
    fn overflow_drains_whole_packet() {
        let mut data = b"$m20000000,4#4f+".iter().copied();
        let mut buf = vec![0; 8];
        let mut recv = RecvPacketBlocking::new();
        assert!(matches!(
            recv.recv(&mut buf, || data.next().ok_or(())),
            Err(RecvPacketError::Capacity)
        ));
        // the trailing ack is still available
        assert_eq!(data.next(), Some(b'+'));
    }
}
