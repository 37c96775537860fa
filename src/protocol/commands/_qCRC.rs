use super::prelude::*;

/// `qCRC:addr,length`: checksum a memory range.
#[derive(Debug)]
pub struct qCRC {
    pub addr: u32,
    pub len: u32,
}

impl<'a> ParseCommand<'a> for qCRC {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let mut body = body.split(|b| *b == b',');
        let addr = decode_hex(body.next()?).ok()?;
        let len = decode_hex(body.next()?).ok()?;
        Some(qCRC { addr, len })
    }
}
