use super::prelude::*;
use crate::protocol::commands::breakpoint::BasicBreakpoint;

#[derive(Debug)]
pub struct Z(pub BasicBreakpoint);

impl<'a> ParseCommand<'a> for Z {
    #[inline(always)]
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        BasicBreakpoint::from_slice(buf.as_body()).map(Z)
    }
}
