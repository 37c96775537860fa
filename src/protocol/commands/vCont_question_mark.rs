use super::prelude::*;

#[derive(Debug)]
pub struct vContQuestionMark;

impl<'a> ParseCommand<'a> for vContQuestionMark {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        Some(vContQuestionMark)
    }
}
