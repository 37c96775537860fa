use super::prelude::*;

#[derive(Debug)]
pub struct qSupported<'a> {
    /// The client's own feature list (e.g: `multiprocess+;swbreak+`).
    pub features: &'a [u8],
}

impl<'a> ParseCommand<'a> for qSupported<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let features: &'a [u8] = match buf.into_body() {
            [] => &[],
            [b':', features @ ..] => features,
            _ => return None,
        };
        Some(qSupported { features })
    }
}
