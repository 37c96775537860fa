use super::prelude::*;
use crate::protocol::qxfer::QXferReadBase;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `qXfer:memory-map:read::offset,length`
    pub(crate) fn handle_memory_map(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: QXferReadBase,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let xml = match self.current_or_reattach(registry) {
            Some(target) => target.memory_map(),
            None => return Err(Error::NonFatalError(0x01)),
        };

        self.write_qxfer(res, xml.as_bytes(), cmd.offset, cmd.length)
    }
}
