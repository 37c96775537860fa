use super::prelude::*;

#[derive(Debug)]
pub struct R;

impl<'a> ParseCommand<'a> for R {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        // the `XX` argument is ignored, as GDB itself does
        Some(R)
    }
}
