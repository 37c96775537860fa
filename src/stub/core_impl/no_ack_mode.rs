use super::prelude::*;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_start_no_ack_mode(&mut self) -> Result<HandlerStatus, Error<C::Error>> {
        debug!("entering No-Ack mode");
        self.features.set_no_ack_mode(true);
        Ok(HandlerStatus::NeedsOk)
    }

    /// Called while answering `qSupported`, before the feature list.
    ///
    /// A GDB reconnecting after an unclean disconnect expects acknowledgments
    /// even though the previous session negotiated No-Ack mode. Acknowledge
    /// its `qSupported` anyway, and watch for a stale `+` once the reply is
    /// out.
    pub(crate) fn on_supported(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
    ) -> Result<(), Error<C::Error>> {
        if !self.features.no_ack_mode() {
            return Ok(());
        }

        // the reply hasn't started yet, so this lands before the `$`
        res.as_conn().write(b'+').map_err(Error::ConnectionWrite)?;
        self.features.set_stale_ack_probe(true);
        Ok(())
    }

    /// Leave No-Ack mode if GDB acknowledges the `qSupported` reply.
    pub(crate) fn probe_stale_ack(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        match conn
            .peek_timeout(self.no_ack_timeout_ms)
            .map_err(Error::ConnectionRead)?
        {
            Some(b'+') => {
                conn.read().map_err(Error::ConnectionRead)?;
                self.features.set_no_ack_mode(false);
                info!("stale acknowledgment after qSupported, leaving No-Ack mode");
            }
            Some(_) | None => {}
        }
        Ok(())
    }
}
