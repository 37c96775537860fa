use super::prelude::*;

/// `F retcode[,errno[,C]][;attachment]`: reply to a File-I/O request.
#[derive(Debug)]
pub struct F {
    pub retcode: i64,
    pub errno: u32,
    /// The user pressed Ctrl-C while the host was servicing the request.
    pub ctrl_c: bool,
}

impl<'a> ParseCommand<'a> for F {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = buf.into_body();
        let body = body.split(|b| *b == b';').next()?;

        let mut fields = body.split(|b| *b == b',');
        let retcode = match fields.next()? {
            [b'-', rest @ ..] => -(decode_hex::<u32>(rest).ok()? as i64),
            digits => decode_hex::<u32>(digits).ok()? as i64,
        };
        let errno = match fields.next() {
            Some(errno) => decode_hex(errno).ok()?,
            None => 0,
        };
        let ctrl_c = matches!(fields.next(), Some(b"C"));

        Some(F {
            retcode,
            errno,
            ctrl_c,
        })
    }
}
