use alloc::vec;

use super::prelude::*;
use crate::protocol::commands::_g_upcase::G;
use crate::protocol::commands::_h_upcase::H;
use crate::protocol::commands::_m::m;
use crate::SINGLE_THREAD_TID;
use crate::TargetAddr;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_stop_reason_query(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if self.in_host_io() {
            return Err(Error::NonFatalError(0x16));
        }

        // nothing to poll, report "exited"
        if registry.current(&self.session).is_none() {
            res.write_str("W00")?;
            return Ok(HandlerStatus::Handled);
        }

        Ok(HandlerStatus::DeferredStopReason)
    }

    pub(crate) fn handle_read_registers(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?.target();
        let mut regs = vec![0; target.description().regs_size()];

        match target.regs_read(&mut regs).handle_fatal()? {
            Some(()) => res.write_hex_buf(&regs)?,
            None => {
                // register data unavailable
                for _ in 0..regs.len() {
                    res.write_str("xx")?;
                }
            }
        }
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_write_registers(
        &mut self,
        registry: &mut TargetRegistry,
        cmd: G<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?.target();
        let size = target.description().regs_size();
        let regs = cmd.vals.get(..size).ok_or(Error::NonFatalError(0x01))?;

        target.regs_write(regs).handle_error()?;
        Ok(HandlerStatus::NeedsOk)
    }

    pub(crate) fn handle_read_memory(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: m,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let m { addr, len } = cmd;
        let target = self.current(registry)?;

        // the reply is hex encoded, so it needs twice the space
        if len > self.packet_size / 2 {
            return Err(Error::NonFatalError(0x02));
        }

        // read everything before replying, a failure must not leave a
        // half-written hex dump behind
        let mut data = vec![0; len];
        target.mem_read(&mut data, addr).handle_error()?;
        res.write_hex_buf(&data)?;
        Ok(HandlerStatus::Handled)
    }

    /// `M` and `X`
    pub(crate) fn handle_write_memory(
        &mut self,
        registry: &mut TargetRegistry,
        addr: TargetAddr,
        len: usize,
        val: &[u8],
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?;

        let data = val.get(..len).ok_or(Error::NonFatalError(0x02))?;
        target.mem_write(addr, data).handle_error()?;
        Ok(HandlerStatus::NeedsOk)
    }

    pub(crate) fn handle_set_thread(&mut self, cmd: H) -> Result<HandlerStatus, Error<C::Error>> {
        match cmd.tid {
            -1 | 0 => {}
            tid if tid == SINGLE_THREAD_TID as i64 => {}
            tid => {
                debug!("H{}: no such thread {}", cmd.op as char, tid);
                return Err(Error::NonFatalError(0x01));
            }
        }
        Ok(HandlerStatus::NeedsOk)
    }

    pub(crate) fn handle_detach(
        &mut self,
        registry: &mut TargetRegistry,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        registry.detach(&mut self.session);
        Ok(HandlerStatus::NeedsOk)
    }

    /// Reset and detach the current target (`k` / `vKill`).
    pub(crate) fn handle_kill(&mut self, registry: &mut TargetRegistry) -> Result<(), Error<C::Error>> {
        let target = match registry.current(&self.session) {
            Some(target) => target,
            None => return Ok(()),
        };

        if target.target().reset().handle_fatal()?.is_none() {
            warn!("{}: reset failed, detaching anyway", target);
        }
        registry.detach(&mut self.session);
        Ok(())
    }

    /// `r` / `R`
    pub(crate) fn handle_restart(
        &mut self,
        registry: &mut TargetRegistry,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if let Some(target) = self.current_or_reattach(registry) {
            if target.target().reset().handle_fatal()?.is_none() {
                warn!("{}: reset failed", target);
            }
        }
        Ok(HandlerStatus::NoReply)
    }

    pub(crate) fn handle_current_thread(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        res.write_str("QC")?;
        res.write_num(SINGLE_THREAD_TID)?;
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_thread_info(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        first: bool,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if first {
            res.write_str("m")?;
            res.write_num(SINGLE_THREAD_TID)?;
        } else {
            // end of list
            res.write_str("l")?;
        }
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_attached(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        // always "attached to an existing process"
        res.write_str("1")?;
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_supported(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        features: &[u8],
    ) -> Result<HandlerStatus, Error<C::Error>> {
        trace!("client features: {:?}", core::str::from_utf8(features));

        self.on_supported(res)?;

        res.write_str("PacketSize=")?;
        res.write_num(self.packet_size)?;
        res.write_str(";qXfer:memory-map:read+;qXfer:features:read+")?;
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_stopped(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if self.session.take_detach_notify() {
            res.write_str("W00")?;
            Ok(HandlerStatus::Handled)
        } else {
            Ok(HandlerStatus::NeedsOk)
        }
    }
}
