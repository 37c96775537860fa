use super::prelude::*;

#[derive(Debug)]
pub struct m {
    pub addr: u32,
    pub len: usize,
}

impl<'a> ParseCommand<'a> for m {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let mut body = buf.as_body().split(|b| *b == b',');
        let addr = decode_hex(body.next()?).ok()?;
        let len = decode_hex(body.next()?).ok()?;
        if body.next().is_some() {
            return None;
        }

        Some(m { addr, len })
    }
}
