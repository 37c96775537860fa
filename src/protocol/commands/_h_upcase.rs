use super::prelude::*;

/// `H op thread-id`: set the thread for subsequent operations.
#[derive(Debug)]
pub struct H {
    pub op: u8,
    /// `-1` means "all threads", `0` means "any thread".
    pub tid: i64,
}

impl<'a> ParseCommand<'a> for H {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let (op, tid) = body.split_first()?;
        let tid = match tid {
            b"-1" => -1,
            _ => decode_hex::<u32>(tid).ok()? as i64,
        };
        Some(H { op: *op, tid })
    }
}
