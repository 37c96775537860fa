use super::prelude::*;

#[derive(Debug)]
pub struct qAttached;

impl<'a> ParseCommand<'a> for qAttached {
    #[inline(always)]
    fn from_packet(_buf: PacketBuf<'a>) -> Option<Self> {
        // an optional `:pid` follows in multiprocess mode
        Some(qAttached)
    }
}
