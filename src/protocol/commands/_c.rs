use super::prelude::*;

#[derive(Debug)]
pub struct c {
    /// Resume address. Probes always resume from the current PC, so this is
    /// parsed but never acted on.
    pub addr: Option<u32>,
}

impl<'a> ParseCommand<'a> for c {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let addr = match body {
            [] => None,
            _ => Some(decode_hex(body).ok()?),
        };
        Some(c { addr })
    }
}
