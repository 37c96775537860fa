use super::prelude::*;
use crate::protocol::commands::_vAttach::vAttach;
use crate::protocol::commands::_vRun::vRun;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_attach(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: vAttach,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        if !registry.attach_n(cmd.n, &mut self.session) {
            return Err(Error::NonFatalError(0x01));
        }

        // a freshly attached target is always halted
        res.write_str("T05thread:")?;
        res.write_num(crate::SINGLE_THREAD_TID)?;
        res.write_str(";")?;
        Ok(HandlerStatus::Handled)
    }

    pub(crate) fn handle_run(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: vRun<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = match self.current_or_reattach(registry) {
            Some(target) => target,
            None => return Err(Error::NonFatalError(0x01)),
        };

        let cmdline = cmd.cmdline();
        debug!("{}: run with command line {:?}", target, cmdline);
        target.set_cmdline(&cmdline);
        target.target().reset().handle_error()?;

        res.write_str("T05")?;
        Ok(HandlerStatus::Handled)
    }
}
