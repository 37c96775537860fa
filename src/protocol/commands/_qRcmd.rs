use super::prelude::*;

#[derive(Debug)]
pub struct qRcmd<'a> {
    pub hex_cmd: &'a [u8],
}

impl<'a> ParseCommand<'a> for qRcmd<'a> {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        Some(qRcmd {
            hex_cmd: decode_hex_buf(buf.into_body()).ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_qRcmd() {
        // "reset"
        let mut body = b"7265736574".to_vec();
        let pkt = qRcmd::from_packet(PacketBuf::new_with_raw_body(&mut body).unwrap()).unwrap();
        assert_eq!(pkt.hex_cmd, b"reset");
    }
}
