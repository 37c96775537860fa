use super::prelude::*;
use crate::protocol::commands::_vFlashErase::vFlashErase;
use crate::protocol::commands::_vFlashWrite::vFlashWrite;
use crate::target::TargetResult;

/// Failed flash operations are always reported as `EFF`.
fn flash_result<V, C>(op: &str, res: TargetResult<V>) -> Result<V, Error<C>> {
    if let Err(e) = &res {
        error!("{} failed: {:?}", op, e);
    }
    res.handle_error_or(0xff)
}

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_flash_erase(
        &mut self,
        registry: &mut TargetRegistry,
        cmd: vFlashErase,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?;
        debug!("flash erase {:#010x}+{:#x}", cmd.addr, cmd.length);
        flash_result("flash erase", target.flash_erase(cmd.addr, cmd.length))?;
        Ok(HandlerStatus::NeedsOk)
    }

    pub(crate) fn handle_flash_write(
        &mut self,
        registry: &mut TargetRegistry,
        cmd: vFlashWrite<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?;
        trace!("flash write {:#010x}+{:#x}", cmd.addr, cmd.val.len());
        flash_result("flash write", target.flash_write(cmd.addr, cmd.val))?;
        Ok(HandlerStatus::NeedsOk)
    }

    pub(crate) fn handle_flash_done(
        &mut self,
        registry: &mut TargetRegistry,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?;
        flash_result("flash done", target.flash_complete())?;
        Ok(HandlerStatus::NeedsOk)
    }
}
