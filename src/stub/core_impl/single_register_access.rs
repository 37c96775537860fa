use alloc::vec;

use super::prelude::*;
use crate::protocol::commands::_p::p;
use crate::protocol::commands::_p_upcase::P;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_read_register(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: p,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?.target();

        let size = match target.description().registers.get(cmd.reg_id) {
            Some(reg) => reg.size(),
            None => {
                warn!("reg id {} does not map onto any known register", cmd.reg_id);
                return Err(Error::NonFatalError(0xff));
            }
        };

        let ops = match target.support_single_register_access() {
            Some(ops) => ops,
            None => {
                for _ in 0..size {
                    res.write_str("xx")?;
                }
                return Ok(HandlerStatus::Handled);
            }
        };

        let mut buf = vec![0; size];
        let len = ops.read_register(cmd.reg_id, &mut buf).handle_error_or(0xff)?;
        if len == 0 {
            for _ in 0..size {
                res.write_str("xx")?;
            }
        } else {
            res.write_hex_buf(buf.get(..len).ok_or(Error::NonFatalError(0xff))?)?;
        }
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_write_register(
        &mut self,
        registry: &mut TargetRegistry,
        cmd: P<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = self.current(registry)?.target();

        if cmd.reg_id >= target.description().registers.len() {
            warn!("reg id {} does not map onto any known register", cmd.reg_id);
            return Err(Error::NonFatalError(0xff));
        }

        match target.support_single_register_access() {
            // empty packet indicates unrecognized query
            None => Ok(HandlerStatus::Handled),
            Some(ops) => {
                ops.write_register(cmd.reg_id, cmd.val).handle_error_or(0xff)?;
                Ok(HandlerStatus::NeedsOk)
            }
        }
    }
}
