use super::prelude::*;

/// `C sig[;addr]`: continue with signal.
#[derive(Debug)]
pub struct C {
    pub sig: u8,
}

impl<'a> ParseCommand<'a> for C {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let sig = body.split(|b| *b == b';').next()?;
        Some(C {
            sig: decode_hex(sig).ok()?,
        })
    }
}
