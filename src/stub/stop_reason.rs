//! Stop replies reported back to the GDB client.

use crate::common::Signal;
use crate::conn::Connection;
use crate::protocol::{ResponseWriter, ResponseWriterError};
use crate::target::HaltReason;
use crate::{TargetAddr, SINGLE_THREAD_TID};

/// What GDB is told when the target stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReply {
    /// `T<sig>thread:1;`
    Signal(Signal),
    /// `T05watch:<addr>;thread:1;`
    Watch(TargetAddr),
    /// `W<code>`
    Exited(u8),
    /// `X<sig>`, the target is gone.
    Terminated(Signal),
}

impl From<HaltReason> for StopReply {
    fn from(reason: HaltReason) -> StopReply {
        match reason {
            HaltReason::Request => StopReply::Signal(Signal::SIGINT),
            HaltReason::Stepping | HaltReason::Breakpoint => StopReply::Signal(Signal::SIGTRAP),
            HaltReason::Watchpoint(addr) => StopReply::Watch(addr),
            HaltReason::Fault => StopReply::Signal(Signal::SIGSEGV),
            HaltReason::Error => StopReply::Terminated(Signal::SIGLOST),
            HaltReason::Exited(code) => StopReply::Exited(code),
        }
    }
}

impl StopReply {
    pub(crate) fn write<C: Connection>(
        self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<(), ResponseWriterError<C::Error>> {
        match self {
            StopReply::Signal(sig) => {
                res.write_code(b'T', sig.0)?;
                write_thread(res)?;
            }
            StopReply::Watch(addr) => {
                res.write_code(b'T', Signal::SIGTRAP.0)?;
                res.write_str("watch:")?;
                res.write_addr(addr)?;
                res.write_str(";")?;
                write_thread(res)?;
            }
            StopReply::Exited(code) => res.write_code(b'W', code)?,
            StopReply::Terminated(sig) => res.write_code(b'X', sig.0)?,
        }
        Ok(())
    }
}

fn write_thread<C: Connection>(
    res: &mut ResponseWriter<'_, C>,
) -> Result<(), ResponseWriterError<C::Error>> {
    res.write_str("thread:")?;
    res.write_num(SINGLE_THREAD_TID)?;
    res.write_str(";")
}
