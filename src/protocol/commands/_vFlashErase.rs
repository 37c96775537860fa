use super::prelude::*;

#[derive(Debug)]
pub struct vFlashErase {
    pub addr: u32,
    pub length: u32,
}

impl<'a> ParseCommand<'a> for vFlashErase {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();

        let mut body = body.splitn(2, |&b| b == b',');
        let addr = decode_hex(body.next()?).ok()?;
        let length = decode_hex(body.next()?).ok()?;
        Some(Self { addr, length })
    }
}
