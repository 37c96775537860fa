use super::prelude::*;

#[derive(Debug)]
pub struct vStopped;

impl<'a> ParseCommand<'a> for vStopped {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        if !buf.as_body().is_empty() {
            return None;
        }
        Some(vStopped)
    }
}
