use super::prelude::*;
use crate::protocol::commands::_qRcmd::qRcmd;
use crate::protocol::ConsoleOutput;
use crate::target::TargetError;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `qRcmd` (GDB's `monitor` command).
    ///
    /// The stub-level handler gets the first look at the command, then the
    /// current target's `MonitorCmd` extension.
    pub(crate) fn handle_monitor_cmd(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: qRcmd<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        debug!("monitor {:?}", core::str::from_utf8(cmd.hex_cmd));

        let mut err: Result<(), Error<C::Error>> = Ok(());
        let mut callback = |msg: &[u8]| {
            let e = (|| -> Result<(), Error<C::Error>> {
                let mut res = ResponseWriter::new(res.as_conn());
                res.write_str("O")?;
                res.write_hex_buf(msg)?;
                res.flush()?;
                Ok(())
            })();

            if let Err(e) = e {
                err = Err(e)
            }
        };

        let mut monitor = self.monitor.take();
        let mut outcome = match monitor.as_mut() {
            Some(handler) => handler(
                registry,
                &mut self.session,
                cmd.hex_cmd,
                ConsoleOutput::new(&mut callback),
            ),
            None => None,
        };
        self.monitor = monitor;

        if outcome.is_none() {
            let ops = registry
                .current(&self.session)
                .and_then(|target| target.target().support_monitor_cmd());

            if let Some(ops) = ops {
                outcome = match ops.handle_monitor_cmd(cmd.hex_cmd, ConsoleOutput::new(&mut callback))
                {
                    Ok(()) => Some(true),
                    Err(TargetError::Fatal(e)) => return Err(Error::TargetFault(e)),
                    Err(e) => {
                        debug!("monitor command failed: {:?}", e);
                        Some(false)
                    }
                };
            }
        }
        err?;

        // a monitor command may have destroyed the current target
        self.flush_notices(res.as_conn())?;

        match outcome {
            // empty packet indicates unrecognized query
            None => Ok(HandlerStatus::Handled),
            Some(true) => Ok(HandlerStatus::NeedsOk),
            Some(false) => {
                res.write_hex_buf(b"Failed\n")?;
                Ok(HandlerStatus::Handled)
            }
        }
    }
}
