use alloc::string::String;

use super::prelude::*;
use crate::protocol::common::hex::is_hex;

/// Longest command line handed to a target.
pub const MAX_CMDLINE_LEN: usize = 80;

/// `vRun;filename[;argument]*`, every field hex encoded.
#[derive(Debug)]
pub struct vRun<'a> {
    args: &'a [u8],
}

impl<'a> ParseCommand<'a> for vRun<'a> {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let args: &'a [u8] = match buf.into_body() {
            [] => &[],
            [b';', args @ ..] => args,
            _ => return None,
        };
        Some(vRun { args })
    }
}

impl vRun<'_> {
    /// Join the program name and its arguments into a single space separated
    /// command line, as later reported to the target through semihosting.
    ///
    /// Spaces and backslashes inside a field are escaped with a backslash.
    /// Decoding stops at the first malformed hex digit, or once the line
    /// reaches [`MAX_CMDLINE_LEN`].
    pub fn cmdline(&self) -> String {
        let mut out = String::new();
        let mut tok = self.args;
        while let Some((&first, rest)) = tok.split_first() {
            if out.len() + 3 > MAX_CMDLINE_LEN {
                break;
            }
            if first == b';' {
                out.push(' ');
                tok = rest;
                continue;
            }
            match tok {
                [hi, lo, rest @ ..] if is_hex(*hi) && is_hex(*lo) => {
                    let c = match decode_hex::<u8>(&[*hi, *lo]) {
                        Ok(c) => c as char,
                        Err(_) => break,
                    };
                    if c == ' ' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                    tok = rest;
                }
                _ => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmdline(body: &[u8]) -> String {
        let mut body = body.to_vec();
        let pkt = vRun::from_packet(PacketBuf::new_with_raw_body(&mut body).unwrap()).unwrap();
        pkt.cmdline()
    }

    #[test]
    fn no_program() {
        assert_eq!(cmdline(b""), "");
        assert_eq!(cmdline(b";"), "");
    }

    #[test]
    fn program_and_args() {
        // "prog", "a b", "c"
        assert_eq!(cmdline(b";70726f67;612062;63"), "prog a\\ b c");
    }

    #[test]
    fn backslash_is_escaped() {
        assert_eq!(cmdline(b";5c"), "\\\\");
    }

    #[test]
    fn stops_at_bad_hex() {
        assert_eq!(cmdline(b";6162zz63"), "ab");
    }

    #[test]
    fn length_is_capped() {
        let long = "61".repeat(200);
        let line = cmdline(format!(";{}", long).as_bytes());
        assert!(line.len() <= MAX_CMDLINE_LEN);
        assert!(line.len() >= MAX_CMDLINE_LEN - 3);
    }
}
