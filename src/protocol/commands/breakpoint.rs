use crate::protocol::common::hex::decode_hex;

// Breakpoint packets look like this:
//
// Z type,addr,kind[;cond_list…][;cmds:persist,cmd_list…]
//
// Hardware comparators have no use for target-side conditions or commands,
// so everything past `kind` is ignored.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicBreakpoint {
    pub type_: u8,
    pub addr: u32,
    /// Breakpoint instruction size, or watched region length.
    pub kind: usize,
}

impl BasicBreakpoint {
    pub fn from_slice(body: &[u8]) -> Option<BasicBreakpoint> {
        let mut body = body.splitn(4, |b| matches!(*b, b',' | b';'));
        let type_ = decode_hex(body.next()?).ok()?;
        let addr = decode_hex(body.next()?).ok()?;
        let kind = decode_hex(body.next()?).ok()?;

        Some(BasicBreakpoint { type_, addr, kind })
    }
}
