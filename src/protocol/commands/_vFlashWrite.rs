use super::prelude::*;

#[derive(Debug)]
pub struct vFlashWrite<'a> {
    pub addr: u32,
    pub val: &'a [u8],
}

impl<'a> ParseCommand<'a> for vFlashWrite<'a> {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();

        let mut body = body.splitn_mut(2, |&b| b == b':');
        let addr = decode_hex(body.next()?).ok()?;
        let val = decode_bin_buf(body.next()?)?;

        Some(vFlashWrite { addr, val })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_buf {
        ($bufname:ident, $body:literal) => {
            let mut test = $body.to_vec();
            let mut buf = PacketBuf::new_with_raw_body(&mut test).unwrap();
            if !buf.strip_prefix(b"vFlashWrite:") {
                panic!("invalid test");
            }
            let $bufname = buf;
        };
    }

    #[test]
    fn valid_vFlashWrite() {
        test_buf!(
            buf,
            b"vFlashWrite:08000000:\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0A"
        );

        let pkt = vFlashWrite::from_packet(buf).unwrap();

        assert_eq!(pkt.addr, 0x0800_0000);
        assert_eq!(pkt.val, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn escaped_payload() {
        test_buf!(buf, b"vFlashWrite:08000000:}\x03}\x04");

        let pkt = vFlashWrite::from_packet(buf).unwrap();

        assert_eq!(pkt.val, b"#$");
    }

    #[test]
    fn invalid_vFlashWrite_wrong_address() {
        test_buf!(
            buf,
            b"vFlashWrite:abcdefg:\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0A"
        );

        assert!(vFlashWrite::from_packet(buf).is_none())
    }

    #[test]
    fn invalid_vFlashWrite_missing_address() {
        test_buf!(buf, b"vFlashWrite:");

        assert!(vFlashWrite::from_packet(buf).is_none())
    }
}
