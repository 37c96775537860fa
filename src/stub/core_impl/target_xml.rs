use super::prelude::*;
use crate::protocol::qxfer::QXferReadBase;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    /// `qXfer:features:read:target.xml:offset,length`
    pub(crate) fn handle_target_xml(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: QXferReadBase,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let xml = match self.current_or_reattach(registry) {
            Some(target) => target.target_xml(),
            None => return Err(Error::NonFatalError(0x01)),
        };

        self.write_qxfer(res, xml.as_bytes(), cmd.offset, cmd.length)
    }
}
