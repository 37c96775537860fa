//! Per-connection debugging session state.
//!
//! The [`Session`] records which target GDB is talking to, and carries the
//! messages that must reach GDB before the next reply (e.g: after the current
//! target vanished underneath it).

use alloc::vec::Vec;

use crate::registry::TargetId;

/// Detach notification queued when the current target is destroyed.
pub(crate) const DETACH_NOTIFICATION: &str = "Stop:W00";

/// Console message queued alongside [`DETACH_NOTIFICATION`].
pub(crate) const DETACH_MESSAGE: &[u8] = b"You are now detached from the previous target.\n";

/// Something that must be sent to GDB before the next reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    /// An asynchronous `%` notification.
    Notification(&'static str),
    /// Text for the GDB console (sent as an `O` packet).
    Console(Vec<u8>),
}

/// State shared by every packet of a debugging session.
///
/// At most one target is "current" (attached) at any time. The "last" target
/// is remembered after a detach, so that `R` / `vRun` / `qXfer` can reattach
/// to it.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<TargetId>,
    last: Option<TargetId>,
    interrupted: bool,
    errno: u32,
    needs_detach_notify: bool,
    notices: Vec<Notice>,
}

impl Session {
    /// A fresh session with no target.
    pub fn new() -> Session {
        Session::default()
    }

    /// The currently attached target, if any.
    pub fn current(&self) -> Option<TargetId> {
        self.current
    }

    /// The most recently detached (or attached) target, if any.
    pub fn last(&self) -> Option<TargetId> {
        self.last
    }

    /// Whether the GDB host reported a Ctrl-C during the last semihosting
    /// call.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// The errno reported by the GDB host for the last semihosting call.
    pub fn errno(&self) -> u32 {
        self.errno
    }

    /// Whether GDB still has to be told that its target went away.
    pub fn needs_detach_notify(&self) -> bool {
        self.needs_detach_notify
    }

    /// Forget every target, and anything waiting to be sent.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub(crate) fn set_attached(&mut self, id: TargetId) {
        self.current = Some(id);
        self.last = Some(id);
    }

    pub(crate) fn set_detached(&mut self) {
        if let Some(id) = self.current.take() {
            self.last = Some(id);
        }
    }

    pub(crate) fn set_host_io_result(&mut self, errno: u32, interrupted: bool) {
        self.errno = errno;
        self.interrupted = interrupted;
    }

    pub(crate) fn take_detach_notify(&mut self) -> bool {
        core::mem::replace(&mut self.needs_detach_notify, false)
    }

    /// Called whenever a target is destroyed.
    ///
    /// If it was the current target, GDB is told about it before the next
    /// reply is sent.
    pub(crate) fn on_target_destroyed(&mut self, id: TargetId) {
        if self.current == Some(id) {
            info!("current target destroyed");
            self.notices
                .push(Notice::Notification(DETACH_NOTIFICATION));
            self.notices.push(Notice::Console(DETACH_MESSAGE.to_vec()));
            self.current = None;
            self.needs_detach_notify = true;
        }

        if self.last == Some(id) {
            self.last = None;
        }
    }

    pub(crate) fn push_console(&mut self, msg: &[u8]) {
        self.notices.push(Notice::Console(msg.to_vec()));
    }

    pub(crate) fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    pub(crate) fn take_notices(&mut self) -> Vec<Notice> {
        core::mem::take(&mut self.notices)
    }
}
