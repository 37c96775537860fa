use super::prelude::*;

#[derive(Debug)]
pub struct D;

impl<'a> ParseCommand<'a> for D {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        // any `;pid` suffix is irrelevant, only one target is ever attached
        Some(D)
    }
}
