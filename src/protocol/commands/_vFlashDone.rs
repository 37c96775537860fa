use super::prelude::*;

#[derive(Debug)]
pub struct vFlashDone;

impl<'a> ParseCommand<'a> for vFlashDone {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        if !buf.as_body().is_empty() {
            return None;
        }
        Some(vFlashDone)
    }
}
