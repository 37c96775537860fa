use core::marker::PhantomData;

use crate::conn::ConnectionExt;
use crate::protocol::commands::Command;
use crate::protocol::qxfer::qxfer_window;
use crate::protocol::{Packet, PacketParseError, RecvPacketBlocking, RecvPacketError, ResponseWriter};
use crate::registry::{TargetDescriptor, TargetRegistry};
use crate::semihosting::HostIoReply;
use crate::session::{Notice, Session};
use crate::stub::error::ProbeStubError as Error;
use crate::stub::MonitorHandler;

/// Common imports used by most handler modules.
///
/// Do not clutter this prelude with types only used by a few handlers.
mod prelude {
    pub(super) use crate::conn::ConnectionExt;
    pub(super) use crate::protocol::ResponseWriter;
    pub(super) use crate::registry::TargetRegistry;
    pub(super) use crate::stub::core_impl::target_result_ext::TargetResultExt;
    pub(super) use crate::stub::core_impl::HandlerStatus;
    pub(super) use crate::stub::core_impl::ProbeStubImpl;
    pub(super) use crate::stub::error::ProbeStubError as Error;
}

mod base;
mod breakpoints;
mod crc;
mod extended_mode;
mod flash;
mod host_io;
mod memory_map;
mod monitor_cmd;
mod no_ack_mode;
mod resume;
mod single_register_access;
mod target_xml;

pub(crate) mod target_result_ext {
    use crate::stub::error::ProbeStubError;
    use crate::target::TargetError;

    /// Extension trait to ease working with `TargetResult` in the ProbeStub
    /// implementation.
    pub(in crate::stub) trait TargetResultExt<V, C> {
        /// Encapsulates the boilerplate associated with handling
        /// `TargetError`s, such as bailing-out on Fatal errors, or
        /// returning response codes.
        ///
        /// `NonFatal` errors are reported as `E01`.
        fn handle_error(self) -> Result<V, ProbeStubError<C>>;

        /// Like `handle_error`, but reporting `NonFatal` errors with a custom
        /// code.
        fn handle_error_or(self, code: u8) -> Result<V, ProbeStubError<C>>;

        /// Only bail out on Fatal errors. Recoverable errors are swallowed,
        /// yielding `None`.
        fn handle_fatal(self) -> Result<Option<V>, ProbeStubError<C>>;
    }

    impl<V, C> TargetResultExt<V, C> for Result<V, TargetError> {
        fn handle_error(self) -> Result<V, ProbeStubError<C>> {
            self.handle_error_or(0x01)
        }

        fn handle_error_or(self, code: u8) -> Result<V, ProbeStubError<C>> {
            let code = match self {
                Ok(v) => return Ok(v),
                Err(TargetError::Fatal(e)) => return Err(ProbeStubError::TargetFault(e)),
                Err(TargetError::NonFatal) => code,
                Err(TargetError::Errno(code)) => code,
            };

            Err(ProbeStubError::NonFatalError(code))
        }

        fn handle_fatal(self) -> Result<Option<V>, ProbeStubError<C>> {
            match self {
                Ok(v) => Ok(Some(v)),
                Err(TargetError::Fatal(e)) => Err(ProbeStubError::TargetFault(e)),
                Err(e) => {
                    debug!("ignoring recoverable target error: {:?}", e);
                    Ok(None)
                }
            }
        }
    }
}

pub(crate) enum State {
    Pump,
    DeferredStopReason,
}

pub(crate) enum HandlerStatus {
    Handled,
    NeedsOk,
    DeferredStopReason,
    /// The packet must not be answered (`k`, `R`, `F`...).
    NoReply,
}

/// Progress of a semihosting call forwarded to the GDB host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostIoState {
    Idle,
    Pending,
    Replied(HostIoReply),
}

pub(crate) struct ProbeStubImpl<C: ConnectionExt> {
    _connection: PhantomData<C>,

    pub(crate) session: Session,
    features: ProtocolFeatures,
    packet_size: usize,
    no_ack_timeout_ms: u32,
    monitor: Option<MonitorHandler>,
    host_io: HostIoState,
}

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub fn new(packet_size: usize, no_ack_timeout_ms: u32) -> ProbeStubImpl<C> {
        ProbeStubImpl {
            _connection: PhantomData,

            session: Session::new(),
            features: ProtocolFeatures::empty(),
            packet_size,
            no_ack_timeout_ms,
            monitor: None,
            host_io: HostIoState::Idle,
        }
    }

    pub fn set_monitor_handler(&mut self, handler: MonitorHandler) {
        self.monitor = Some(handler);
    }

    /// Receive and answer one packet. If the packet resumed the target, keep
    /// polling it until it halts again.
    pub fn pump(
        &mut self,
        conn: &mut C,
        buf: &mut [u8],
        registry: &mut TargetRegistry,
    ) -> Result<(), Error<C::Error>> {
        match self.recv_and_handle(conn, buf, registry)? {
            State::Pump => Ok(()),
            State::DeferredStopReason => self.wait_for_stop(conn, buf, registry),
        }
    }

    /// The outermost recovery point: report the failure, and start over with
    /// no targets.
    pub fn recover(
        &mut self,
        conn: &mut C,
        registry: &mut TargetRegistry,
        err: Error<C::Error>,
    ) -> Result<(), Error<C::Error>> {
        match err {
            Error::TargetFault(msg) => error!("fatal target error: {}", msg),
            _ => error!("unrecoverable error while serving GDB"),
        }

        let mut res = ResponseWriter::new(conn);
        res.write_code(b'E', 0xff)?;
        res.flush()?;

        registry.destroy_all(&mut self.session);
        self.host_io = HostIoState::Idle;
        info!("all targets destroyed");
        Ok(())
    }

    fn recv_and_handle(
        &mut self,
        conn: &mut C,
        buf: &mut [u8],
        registry: &mut TargetRegistry,
    ) -> Result<State, Error<C::Error>> {
        let pkt_buf = match RecvPacketBlocking::new().recv(buf, || conn.read()) {
            Ok(pkt_buf) => pkt_buf,
            Err(RecvPacketError::Connection(e)) => return Err(Error::ConnectionRead(e)),
            Err(RecvPacketError::Capacity) => {
                self.reject_packet(conn, Error::PacketBufferOverflow)?;
                return Ok(State::Pump);
            }
        };

        match Packet::from_buf(pkt_buf) {
            Ok(packet) => self.handle_packet(conn, registry, packet),
            Err(e) => {
                self.reject_packet(conn, Error::PacketParse(e))?;
                Ok(State::Pump)
            }
        }
    }

    fn reject_packet(&mut self, conn: &mut C, err: Error<C::Error>) -> Result<(), Error<C::Error>> {
        let code = match err {
            Error::PacketBufferOverflow => 0x02,
            Error::PacketParse(PacketParseError::MalformedCommand) => {
                debug!("malformed command");
                0x01
            }
            Error::PacketParse(e) => {
                warn!("dropping packet: {:?}", e);
                if !self.features.no_ack_mode() {
                    conn.write(b'-').map_err(Error::ConnectionWrite)?;
                    conn.flush().map_err(Error::ConnectionWrite)?;
                }
                return Ok(());
            }
            e => return Err(e),
        };

        self.ack(conn)?;
        let mut res = ResponseWriter::new(conn);
        res.write_code(b'E', code)?;
        res.flush()?;
        Ok(())
    }

    fn handle_packet(
        &mut self,
        conn: &mut C,
        registry: &mut TargetRegistry,
        packet: Packet<'_>,
    ) -> Result<State, Error<C::Error>> {
        match packet {
            Packet::Ack => Ok(State::Pump),
            Packet::Nack => {
                warn!("client nack'd the last packet, but retransmission is not supported");
                Ok(State::Pump)
            }
            Packet::Interrupt => {
                debug!("<-- interrupt packet while halted");
                Ok(State::Pump)
            }
            Packet::PortClosed => {
                debug!("<-- port closed");
                if self.session.current().is_some() {
                    registry.detach(&mut self.session);
                }
                Ok(State::Pump)
            }
            Packet::Command(command) => {
                self.ack(conn)?;
                self.flush_notices(conn)?;

                let mut res = ResponseWriter::new(conn);
                match self.handle_command(&mut res, registry, command) {
                    Ok(HandlerStatus::Handled) => {}
                    Ok(HandlerStatus::NeedsOk) => res.write_str("OK")?,
                    Ok(HandlerStatus::DeferredStopReason) => {
                        res.as_conn().flush().map_err(Error::ConnectionWrite)?;
                        return Ok(State::DeferredStopReason);
                    }
                    Ok(HandlerStatus::NoReply) => {
                        res.as_conn().flush().map_err(Error::ConnectionWrite)?;
                        return Ok(State::Pump);
                    }
                    // HACK: handling this "dummy" error is required as part of the
                    // `TargetResultExt::handle_error()` machinery.
                    Err(Error::NonFatalError(code)) => res.write_code(b'E', code)?,
                    Err(Error::NoTarget) => res.write_code(b'E', 0xff)?,
                    Err(e) => return Err(e),
                }
                res.flush()?;

                if self.features.stale_ack_probe() {
                    self.features.set_stale_ack_probe(false);
                    self.probe_stale_ack(conn)?;
                }

                Ok(State::Pump)
            }
        }
    }

    fn handle_command(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: Command<'_>,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        // `handle_X` methods are defined in the submodules
        match cmd {
            Command::QuestionMark(_) => self.handle_stop_reason_query(res, registry),
            Command::ExclamationMark(_) => Ok(HandlerStatus::NeedsOk),
            Command::g(_) => self.handle_read_registers(res, registry),
            Command::G(cmd) => self.handle_write_registers(registry, cmd),
            Command::m(cmd) => self.handle_read_memory(res, registry, cmd),
            Command::M(cmd) => self.handle_write_memory(registry, cmd.addr, cmd.len, cmd.val),
            Command::X(cmd) => self.handle_write_memory(registry, cmd.addr, cmd.len, cmd.val),
            Command::H(cmd) => self.handle_set_thread(cmd),
            Command::D(_) => self.handle_detach(registry),
            Command::k(_) => self.handle_kill(registry).map(|_| HandlerStatus::NoReply),
            Command::r(_) | Command::R(_) => self.handle_restart(registry),
            Command::qC(_) => self.handle_current_thread(res),
            Command::qfThreadInfo(_) => self.handle_thread_info(res, true),
            Command::qsThreadInfo(_) => self.handle_thread_info(res, false),
            Command::qAttached(_) => self.handle_attached(res),
            Command::qSupported(cmd) => self.handle_supported(res, cmd.features),
            Command::vStopped(_) => self.handle_stopped(res),

            Command::p(cmd) => self.handle_read_register(res, registry, cmd),
            Command::P(cmd) => self.handle_write_register(registry, cmd),

            Command::c(_) => self.handle_resume(res, registry, false),
            Command::C(cmd) => {
                trace!("ignoring resume signal {}", cmd.sig);
                self.handle_resume(res, registry, false)
            }
            Command::s(_) => self.handle_resume(res, registry, true),
            Command::vCont(cmd) => self.handle_vcont(res, registry, cmd),
            Command::vContQuestionMark(_) => self.handle_vcont_query(res),
            Command::F(cmd) => self.handle_host_io_reply(cmd),

            Command::Z(cmd) => self.handle_breakwatch(registry, true, cmd.0),
            Command::z(cmd) => self.handle_breakwatch(registry, false, cmd.0),

            Command::vAttach(cmd) => self.handle_attach(res, registry, cmd),
            Command::vKill(_) => self.handle_kill(registry).map(|_| HandlerStatus::NeedsOk),
            Command::vRun(cmd) => self.handle_run(res, registry, cmd),

            Command::vFlashErase(cmd) => self.handle_flash_erase(registry, cmd),
            Command::vFlashWrite(cmd) => self.handle_flash_write(registry, cmd),
            Command::vFlashDone(_) => self.handle_flash_done(registry),

            Command::qXferFeaturesRead(cmd) => self.handle_target_xml(res, registry, cmd),
            Command::qXferMemoryMapRead(cmd) => self.handle_memory_map(res, registry, cmd),
            Command::qCRC(cmd) => self.handle_crc(res, registry, cmd),
            Command::qRcmd(cmd) => self.handle_monitor_cmd(res, registry, cmd),
            Command::QStartNoAckMode(_) => self.handle_start_no_ack_mode(),

            // in the worst case, the command could not be parsed...
            Command::Unknown(cmd) => {
                debug!("Unknown command: {:?}", core::str::from_utf8(cmd));
                Ok(HandlerStatus::Handled)
            }
        }
    }

    fn ack(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        if !self.features.no_ack_mode() {
            conn.write(b'+').map_err(Error::ConnectionWrite)?;
        }
        Ok(())
    }

    /// Send everything the session queued for GDB (target-destroyed
    /// notifications, console messages).
    fn flush_notices(&mut self, conn: &mut C) -> Result<(), Error<C::Error>> {
        if !self.session.has_notices() {
            return Ok(());
        }

        for notice in self.session.take_notices() {
            match notice {
                Notice::Notification(body) => {
                    let mut res = ResponseWriter::new_notification(conn);
                    res.write_str(body)?;
                    res.flush()?;
                }
                Notice::Console(msg) => {
                    let mut res = ResponseWriter::new(conn);
                    res.write_str("O")?;
                    res.write_hex_buf(&msg)?;
                    res.flush()?;
                }
            }
        }
        Ok(())
    }

    fn current<'r>(
        &self,
        registry: &'r mut TargetRegistry,
    ) -> Result<&'r mut TargetDescriptor, Error<C::Error>> {
        registry.current(&self.session).ok_or(Error::NoTarget)
    }

    /// The current target. If there is none, try to reattach to the last one.
    fn current_or_reattach<'r>(
        &mut self,
        registry: &'r mut TargetRegistry,
    ) -> Option<&'r mut TargetDescriptor> {
        if self.session.current().is_none() {
            if let Some(last) = self.session.last() {
                debug!("reattaching to the last target");
                registry.attach(last, &mut self.session);
            }
        }
        registry.current(&self.session)
    }

    /// Answer a `qXfer:<object>:read` request from an in-memory document.
    fn write_qxfer(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        doc: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        match qxfer_window(doc, offset, length) {
            None => return Err(Error::NonFatalError(0x01)),
            Some((true, _)) => res.write_str("l")?,
            Some((false, data)) => {
                res.write_str("m")?;
                res.write_binary(data)?;
            }
        }
        Ok(HandlerStatus::Handled)
    }
}

#[derive(Copy, Clone)]
#[repr(transparent)]
struct ProtocolFeatures(u8);

// This bitflag is not part of the protocol - it is an internal implementation
// detail. The alternative would be to use multiple `bool` fields.
bitflags::bitflags! {
    impl ProtocolFeatures: u8 {
        const NO_ACK_MODE = 1 << 0;
        const STALE_ACK_PROBE = 1 << 1;
    }
}

impl ProtocolFeatures {
    #[inline(always)]
    fn no_ack_mode(&self) -> bool {
        self.contains(ProtocolFeatures::NO_ACK_MODE)
    }

    #[inline(always)]
    fn set_no_ack_mode(&mut self, val: bool) {
        self.set(ProtocolFeatures::NO_ACK_MODE, val)
    }

    #[inline(always)]
    fn stale_ack_probe(&self) -> bool {
        self.contains(ProtocolFeatures::STALE_ACK_PROBE)
    }

    #[inline(always)]
    fn set_stale_ack_probe(&mut self, val: bool) {
        self.set(ProtocolFeatures::STALE_ACK_PROBE, val)
    }
}
