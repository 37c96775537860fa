use super::prelude::*;
use crate::breakwatch::{BreakwatchKind, BreakwatchStatus};
use crate::protocol::commands::breakpoint::BasicBreakpoint;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `Z` (`set == true`) and `z`.
    pub(crate) fn handle_breakwatch(
        &mut self,
        registry: &mut TargetRegistry,
        set: bool,
        bp: BasicBreakpoint,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?;

        let kind = match BreakwatchKind::from_packet_type(bp.type_) {
            Some(kind) => kind,
            None => {
                debug!("unsupported breakpoint type {}", bp.type_);
                return Ok(HandlerStatus::Handled);
            }
        };

        let status = if set {
            target.breakwatch_set(kind, bp.addr, bp.kind)
        } else {
            target.breakwatch_clear(kind, bp.addr, bp.kind)
        }
        .handle_error()?;

        match status {
            BreakwatchStatus::Ok => Ok(HandlerStatus::NeedsOk),
            // empty packet indicates unrecognized query
            BreakwatchStatus::Unsupported => Ok(HandlerStatus::Handled),
            BreakwatchStatus::Exhausted => {
                debug!("no free unit for {:?} at {:#010x}", kind, bp.addr);
                Err(Error::NonFatalError(0x01))
            }
            BreakwatchStatus::NotFound => {
                debug!("no {:?} at {:#010x} to clear", kind, bp.addr);
                Err(Error::NonFatalError(0x01))
            }
        }
    }
}
