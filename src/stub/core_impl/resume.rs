use super::prelude::*;
use crate::protocol::commands::_vCont::{vCont, VContAction};
use crate::stub::stop_reason::StopReply;
use crate::target::{HaltPoll, HaltReason, TargetError};

/// Out-of-band bytes which ask a running target to halt.
const INTERRUPT: u8 = 0x03;
const PORT_CLOSED: u8 = 0x04;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `c`, `C` and `s`.
    ///
    /// The optional resume address is ignored: GDB always writes the PC
    /// explicitly before resuming from a different location.
    pub(crate) fn handle_resume(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        step: bool,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if self.in_host_io() {
            return Err(Error::NonFatalError(0x16));
        }

        let target = match registry.current(&self.session) {
            Some(target) => target,
            None => {
                res.write_str("X1D")?;
                return Ok(HandlerStatus::Handled);
            }
        };

        target.target().halt_resume(step).handle_error()?;
        Ok(HandlerStatus::DeferredStopReason)
    }

    pub(crate) fn handle_vcont(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: vCont,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        match cmd.action {
            VContAction::Continue => self.handle_resume(res, registry, false),
            VContAction::Step => self.handle_resume(res, registry, true),
            VContAction::ContinueWithSignal(sig) => {
                trace!("ignoring resume signal {}", sig);
                self.handle_resume(res, registry, false)
            }
            VContAction::StepWithSignal(sig) => {
                trace!("ignoring resume signal {}", sig);
                self.handle_resume(res, registry, true)
            }
            VContAction::Stop => {
                if self.in_host_io() {
                    return Err(Error::NonFatalError(0x16));
                }
                let target = match registry.current(&self.session) {
                    Some(target) => target,
                    None => {
                        res.write_str("X1D")?;
                        return Ok(HandlerStatus::Handled);
                    }
                };
                if target.target().halt_request().handle_fatal()?.is_none() {
                    warn!("{}: core did not acknowledge the halt request", target);
                }
                Ok(HandlerStatus::DeferredStopReason)
            }
        }
    }

    pub(crate) fn handle_vcont_query(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        res.write_str("vCont;c;C;s;S;t")?;
        Ok(HandlerStatus::Handled)
    }

    /// Poll the current target until it halts, and report why.
    ///
    /// Ctrl-C from GDB is checked between polls. Semihosting traps are
    /// serviced inline, and never reported as stops (unless GDB interrupted
    /// the call).
    pub(crate) fn wait_for_stop(
        &mut self,
        conn: &mut C,
        buf: &mut [u8],
        registry: &mut TargetRegistry,
    ) -> Result<(), Error<C::Error>> {
        let reply = loop {
            let target = match registry.current(&self.session) {
                Some(target) => target.target(),
                None => break StopReply::Terminated(crate::common::Signal::SIGLOST),
            };

            let poll = match target.halt_poll() {
                Ok(poll) => poll,
                Err(TargetError::Fatal(e)) => return Err(Error::TargetFault(e)),
                Err(e) => {
                    warn!("halt poll failed: {:?}", e);
                    HaltPoll::Halted(HaltReason::Error)
                }
            };

            match poll {
                HaltPoll::Running => {
                    let byte = match conn.peek().map_err(Error::ConnectionRead)? {
                        Some(_) => conn.read().map_err(Error::ConnectionRead)?,
                        None => continue,
                    };

                    match byte {
                        INTERRUPT | PORT_CLOSED => {
                            debug!("<-- interrupt, halting target");
                            if let Err(e) = target.halt_request() {
                                match e {
                                    TargetError::Fatal(e) => return Err(Error::TargetFault(e)),
                                    e => warn!("halt request failed: {:?}", e),
                                }
                            }
                        }
                        b => trace!("discarding {:#04x} while the target runs", b),
                    }
                }
                HaltPoll::Halted(reason) => {
                    if reason == HaltReason::Error {
                        error!("target lost while running");
                        registry.detach(&mut self.session);
                    }
                    break StopReply::from(reason);
                }
                HaltPoll::HostIo(req) => {
                    let reply = match self.forward_host_io(conn, buf, registry, req)? {
                        Some(reply) => reply,
                        None => {
                            // the target went away while the host serviced the call
                            break StopReply::Terminated(crate::common::Signal::SIGLOST);
                        }
                    };

                    if reply.interrupted {
                        break StopReply::from(HaltReason::Request);
                    }

                    if let Some(target) = registry.current(&self.session) {
                        target.target().halt_resume(false).handle_fatal()?;
                    }
                }
            }
        };

        self.flush_notices(conn)?;
        let mut res = ResponseWriter::new(conn);
        reply.write(&mut res)?;
        res.flush()?;
        Ok(())
    }
}
