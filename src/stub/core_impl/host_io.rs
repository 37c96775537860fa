use alloc::string::ToString;

use super::prelude::*;
use super::{HostIoState, State};
use crate::protocol::commands::_f_upcase::F;
use crate::semihosting::{HostIoReply, HostIoRequest};

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `true` while a semihosting request is waiting for GDB's `F` reply.
    pub(crate) fn in_host_io(&self) -> bool {
        self.host_io == HostIoState::Pending
    }

    pub(crate) fn handle_host_io_reply(&mut self, cmd: F) -> Result<HandlerStatus, Error<C::Error>> {
        if !self.in_host_io() {
            debug!("F packet outside of a semihosting call");
            return Ok(HandlerStatus::Handled);
        }

        self.host_io = HostIoState::Replied(HostIoReply {
            retcode: cmd.retcode as i32,
            errno: cmd.errno,
            interrupted: cmd.ctrl_c,
        });
        Ok(HandlerStatus::NoReply)
    }

    /// Send `req` to GDB, and serve packets until its `F` reply arrives.
    ///
    /// The reply is handed to the current target's host I/O extension.
    /// Returns `None` if the target went away in the meantime.
    pub(crate) fn forward_host_io(
        &mut self,
        conn: &mut C,
        buf: &mut [u8],
        registry: &mut TargetRegistry,
        req: HostIoRequest,
    ) -> Result<Option<HostIoReply>, Error<C::Error>> {
        debug!("forwarding semihosting call: {}", req);

        self.flush_notices(conn)?;
        let mut res = ResponseWriter::new(conn);
        res.write_str(&req.to_string())?;
        res.flush()?;

        self.host_io = HostIoState::Pending;
        let reply = loop {
            if let HostIoState::Replied(reply) = self.host_io {
                break reply;
            }
            if self.session.current().is_none() {
                self.host_io = HostIoState::Idle;
                return Ok(None);
            }

            match self.recv_and_handle(conn, buf, registry) {
                Ok(State::Pump) => {}
                Ok(State::DeferredStopReason) => {
                    warn!("ignoring stop reason request during a semihosting call")
                }
                Err(e) => {
                    self.host_io = HostIoState::Idle;
                    return Err(e);
                }
            }
        };
        self.host_io = HostIoState::Idle;

        trace!("semihosting reply: {:?}", reply);
        self.session
            .set_host_io_result(reply.errno, reply.interrupted);

        let target = match registry.current(&self.session) {
            Some(target) => target,
            None => return Ok(None),
        };
        match target.target().support_host_io() {
            Some(ops) => {
                ops.syscall_reply(reply).handle_fatal()?;
            }
            None => warn!("target has no host I/O support, dropping the reply"),
        }

        Ok(Some(reply))
    }
}
