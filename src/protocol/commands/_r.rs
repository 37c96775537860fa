use super::prelude::*;

#[derive(Debug)]
pub struct r;

impl<'a> ParseCommand<'a> for r {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        Some(r)
    }
}
