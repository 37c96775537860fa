use super::prelude::*;

#[derive(Debug)]
pub struct vKill;

impl<'a> ParseCommand<'a> for vKill {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        // the pid is irrelevant, only one target is ever attached
        Some(vKill)
    }
}
