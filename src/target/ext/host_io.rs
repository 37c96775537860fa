//! Complete semihosting calls forwarded to the GDB host.
//!
//! See [`crate::semihosting`] for the request side.

use crate::semihosting::HostIoReply;
use crate::target::TargetResult;

/// Target Extension - Receive the result of a semihosting call.
///
/// Drivers that report [`HaltPoll::HostIo`](crate::target::HaltPoll::HostIo)
/// from `halt_poll` must implement this extension. Once the GDB host answers
/// with an `F` packet, the reply is handed to `syscall_reply`, which should
/// place the return value where the program expects it (e.g: `r0` on
/// Cortex-M) and step past the trapping instruction.
///
/// The stub resumes the target afterwards, unless the host reported that the
/// user pressed Ctrl-C during the call.
pub trait HostIo {
    /// Deliver the host's reply to the pending semihosting call.
    fn syscall_reply(&mut self, reply: HostIoReply) -> TargetResult<()>;
}

define_ext!(HostIoOps, HostIo);
