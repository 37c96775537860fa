use super::prelude::*;

/// `vAttach;n`: attach to the n-th (1-based) target in the registry.
#[derive(Debug)]
pub struct vAttach {
    pub n: usize,
}

impl<'a> ParseCommand<'a> for vAttach {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let n = decode_hex(buf.into_body()).ok()?;
        Some(vAttach { n })
    }
}
