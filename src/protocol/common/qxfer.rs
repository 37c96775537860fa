use crate::protocol::commands::ParseCommand;
use crate::protocol::common::hex::decode_hex;
use crate::protocol::packet::PacketBuf;

/// The `offset,length` window shared by every `qXfer:<object>:read` packet.
///
/// The command table matches the object and annex as part of the packet
/// prefix, so only the window is left to parse.
#[derive(Debug, PartialEq, Eq)]
pub struct QXferReadBase {
    pub offset: usize,
    pub length: usize,
}

impl<'a> ParseCommand<'a> for QXferReadBase {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let mut body = body.split(|b| *b == b',');
        let offset = decode_hex(body.next()?).ok()?;
        let length = decode_hex(body.next()?).ok()?;

        Some(QXferReadBase { offset, length })
    }
}

/// Serve a `qXfer` read from an in-memory document.
///
/// Returns `None` if `offset` lies past the end of the document. Otherwise
/// returns whether this is the final chunk along with the chunk itself.
pub fn qxfer_window(doc: &[u8], offset: usize, length: usize) -> Option<(bool, &[u8])> {
    if offset > doc.len() {
        return None;
    }
    let rest = &doc[offset..];
    if rest.is_empty() {
        return Some((true, rest));
    }
    let n = rest.len().min(length);
    Some((false, &rest[..n]))
}
