use super::prelude::*;

/// `X addr,len:binary`: write escaped binary data to memory.
#[derive(Debug)]
pub struct X<'a> {
    pub addr: u32,
    pub len: usize,
    pub val: &'a [u8],
}

impl<'a> ParseCommand<'a> for X<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();

        let mut body = body.splitn_mut(3, |&b| b == b',' || b == b':');
        let addr = decode_hex(body.next()?).ok()?;
        let len = decode_hex(body.next()?).ok()?;
        let val = decode_bin_buf(body.next()?)?;

        Some(X { addr, len, val })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_X() {
        let mut body = b"20000000,3:a}\x03:".to_vec();
        let pkt = X::from_packet(PacketBuf::new_with_raw_body(&mut body).unwrap()).unwrap();
        assert_eq!(pkt.addr, 0x2000_0000);
        assert_eq!(pkt.len, 3);
        assert_eq!(pkt.val, b"a#:");
    }

    #[test]
    fn probe_write() {
        // GDB probes for `X` support with a zero-length write
        let mut body = b"20000000,0:".to_vec();
        let pkt = X::from_packet(PacketBuf::new_with_raw_body(&mut body).unwrap()).unwrap();
        assert_eq!(pkt.len, 0);
        assert!(pkt.val.is_empty());
    }
}
