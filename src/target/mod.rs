//! The [`Target`] trait, implemented by every chip driver, and its optional
//! extension traits.
//!
//! ### Mandatory vs. optional operations
//!
//! Every chip driver must be able to touch memory, control execution, and
//! describe its register file. Everything else (single register access,
//! hardware breakpoints/watchpoints, target-specific `monitor` commands,
//! semihosting) is optional, and exposed using the "inlineable dyn extension
//! trait" pattern:
//!
//! ```rust,ignore
//! impl Target for MyChip {
//!     // ...
//!
//!     fn support_breakwatch(&mut self) -> Option<BreakwatchUnitsOps<'_>> {
//!         Some(self)
//!     }
//! }
//!
//! impl BreakwatchUnits for MyChip {
//!     // ...
//! }
//! ```
//!
//! When a driver returns `None`, the stub falls back to the protocol-defined
//! "unsupported" behavior for the associated packets (an empty reply, or `xx`
//! register data for `p`).
//!
//! ### Failed memory accesses
//!
//! Memory accesses do not return a `Result`. Debug ports latch transfer
//! faults, so the core performs the access and then asks the driver whether
//! anything went wrong via [`Target::check_error`]. This lets multi-word
//! accesses stay simple while still surfacing failures as `Enn` replies.
//!
//! ### Fatal errors
//!
//! Every other fallible operation returns a [`TargetResult`]. A
//! [`TargetError::Fatal`] error aborts whatever the stub was doing, tears down
//! all targets, and returns the session to its idle state.

use crate::TargetAddr;

pub mod description;
pub mod ext;

#[cfg(test)]
pub(crate) mod mock;

pub use description::{RegisterInfo, TargetDescription};

/// The error type for recoverable and unrecoverable target failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TargetError {
    /// A non-specific, non-fatal error has occurred.
    ///
    /// Reported to the GDB client as a generic error code.
    NonFatal,
    /// Non-fatal error with an explicit error code, reported as `Enn`.
    Errno(u8),
    /// An unrecoverable error (e.g: the debug port stopped responding).
    ///
    /// Unwinds the stub back to its outermost recovery point.
    Fatal(&'static str),
}

/// A specialized `Result` type for `Target` operations.
pub type TargetResult<T> = Result<T, TargetError>;

/// Why a halted target stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Halted at the debugger's request (Ctrl-C or an explicit halt).
    Request,
    /// A single-step completed.
    Stepping,
    /// Hit a breakpoint.
    Breakpoint,
    /// A watchpoint triggered on the given data address.
    Watchpoint(TargetAddr),
    /// The core took a fault (hard fault, bus fault...).
    Fault,
    /// The target can no longer be debugged (lost power, lost the debug link,
    /// locked itself out...).
    Error,
    /// The program running on the target asked to exit via semihosting.
    Exited(u8),
}

/// Result of a [`Target::halt_poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltPoll {
    /// The core is still executing.
    Running,
    /// The core halted.
    Halted(HaltReason),
    /// The core stopped on a semihosting trap which requires the GDB host to
    /// perform File-I/O on its behalf. See [`crate::semihosting`].
    HostIo(crate::semihosting::HostIoRequest),
}

/// Operations every chip driver must provide.
///
/// All methods are invoked from the stub's single control flow, one packet at
/// a time, and only while the target is attached (except for
/// [`attach`](Target::attach) itself).
pub trait Target {
    /// Called when GDB attaches to this target.
    ///
    /// On success, the core must be halted, its debug events enabled, and all
    /// hardware comparators disabled.
    fn attach(&mut self) -> TargetResult<()> {
        Ok(())
    }

    /// Called when GDB detaches from this target (or kills it).
    ///
    /// Should restore any debug-enable state modified by
    /// [`attach`](Target::attach) and let the core run freely. Failures are
    /// logged, but never prevent the detach from completing.
    fn detach(&mut self) -> TargetResult<()> {
        Ok(())
    }

    /// Return `true` (and clear the latched error) if a memory access since
    /// the previous call failed.
    fn check_error(&mut self) -> bool;

    /// Read `dest.len()` bytes starting at `src`.
    ///
    /// Failures are reported through [`check_error`](Target::check_error).
    fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr);

    /// Write `src` to memory starting at `dest`.
    ///
    /// Failures are reported through [`check_error`](Target::check_error).
    fn mem_write(&mut self, dest: TargetAddr, src: &[u8]);

    /// Describe the target's architecture and register file.
    fn description(&self) -> &'static TargetDescription;

    /// Read the entire register file (in [`description`](Target::description)
    /// order) into `regs`.
    ///
    /// The default implementation reads each register in turn using the
    /// [`SingleRegisterAccess`](ext::single_register_access::SingleRegisterAccess)
    /// extension.
    fn regs_read(&mut self, regs: &mut [u8]) -> TargetResult<()> {
        let desc = self.description();
        let ops = match self.support_single_register_access() {
            Some(ops) => ops,
            None => return Err(TargetError::NonFatal),
        };

        let mut offset = 0;
        for (id, reg) in desc.registers.iter().enumerate() {
            let size = reg.size();
            let buf = regs
                .get_mut(offset..offset + size)
                .ok_or(TargetError::NonFatal)?;
            ops.read_register(id, buf)?;
            offset += size;
        }
        Ok(())
    }

    /// Write the entire register file (in [`description`](Target::description)
    /// order) from `regs`.
    ///
    /// The default implementation writes each register in turn using the
    /// [`SingleRegisterAccess`](ext::single_register_access::SingleRegisterAccess)
    /// extension.
    fn regs_write(&mut self, regs: &[u8]) -> TargetResult<()> {
        let desc = self.description();
        let ops = match self.support_single_register_access() {
            Some(ops) => ops,
            None => return Err(TargetError::NonFatal),
        };

        let mut offset = 0;
        for (id, reg) in desc.registers.iter().enumerate() {
            let size = reg.size();
            let val = regs
                .get(offset..offset + size)
                .ok_or(TargetError::NonFatal)?;
            ops.write_register(id, val)?;
            offset += size;
        }
        Ok(())
    }

    /// Reset the target (system reset, leaving the core halted if it was
    /// halted before).
    fn reset(&mut self) -> TargetResult<()>;

    /// Ask the core to halt.
    ///
    /// This is best-effort: a core sleeping in a low-power state may not
    /// respond. Implementations must bound the wait, and report a timeout as
    /// a non-fatal error rather than hang.
    fn halt_request(&mut self) -> TargetResult<()>;

    /// Non-blocking query of the core's run state.
    fn halt_poll(&mut self) -> TargetResult<HaltPoll>;

    /// Resume execution, or execute a single instruction if `step` is set.
    fn halt_resume(&mut self, step: bool) -> TargetResult<()>;

    /// Called before the first flash operation of a `load`.
    ///
    /// The default implementation resets the target, so that flash
    /// programming never starts from inside an interrupt handler.
    fn enter_flash_mode(&mut self) -> TargetResult<()> {
        self.reset()
    }

    /// Called after the final flash operation of a `load`.
    ///
    /// The default implementation resets the target.
    fn exit_flash_mode(&mut self) -> TargetResult<()> {
        self.reset()
    }

    /// Record the command line passed by `vRun`, for later retrieval by the
    /// program through semihosting.
    fn set_cmdline(&mut self, cmdline: &str) {
        let _ = cmdline;
    }

    /// Support for reading / writing individual registers.
    #[inline(always)]
    fn support_single_register_access(
        &mut self,
    ) -> Option<ext::single_register_access::SingleRegisterAccessOps<'_>> {
        None
    }

    /// Support for hardware breakpoints and watchpoints.
    #[inline(always)]
    fn support_breakwatch(&mut self) -> Option<ext::breakwatch::BreakwatchUnitsOps<'_>> {
        None
    }

    /// Support for target-specific `monitor` commands.
    #[inline(always)]
    fn support_monitor_cmd(&mut self) -> Option<ext::monitor_cmd::MonitorCmdOps<'_>> {
        None
    }

    /// Support for semihosting File-I/O forwarded to the GDB host.
    #[inline(always)]
    fn support_host_io(&mut self) -> Option<ext::host_io::HostIoOps<'_>> {
        None
    }
}

impl<T: Target + ?Sized> Target for alloc::boxed::Box<T> {
    fn attach(&mut self) -> TargetResult<()> {
        (**self).attach()
    }

    fn detach(&mut self) -> TargetResult<()> {
        (**self).detach()
    }

    fn check_error(&mut self) -> bool {
        (**self).check_error()
    }

    fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr) {
        (**self).mem_read(dest, src)
    }

    fn mem_write(&mut self, dest: TargetAddr, src: &[u8]) {
        (**self).mem_write(dest, src)
    }

    fn description(&self) -> &'static TargetDescription {
        (**self).description()
    }

    fn regs_read(&mut self, regs: &mut [u8]) -> TargetResult<()> {
        (**self).regs_read(regs)
    }

    fn regs_write(&mut self, regs: &[u8]) -> TargetResult<()> {
        (**self).regs_write(regs)
    }

    fn reset(&mut self) -> TargetResult<()> {
        (**self).reset()
    }

    fn halt_request(&mut self) -> TargetResult<()> {
        (**self).halt_request()
    }

    fn halt_poll(&mut self) -> TargetResult<HaltPoll> {
        (**self).halt_poll()
    }

    fn halt_resume(&mut self, step: bool) -> TargetResult<()> {
        (**self).halt_resume(step)
    }

    fn enter_flash_mode(&mut self) -> TargetResult<()> {
        (**self).enter_flash_mode()
    }

    fn exit_flash_mode(&mut self) -> TargetResult<()> {
        (**self).exit_flash_mode()
    }

    fn set_cmdline(&mut self, cmdline: &str) {
        (**self).set_cmdline(cmdline)
    }

    fn support_single_register_access(
        &mut self,
    ) -> Option<ext::single_register_access::SingleRegisterAccessOps<'_>> {
        (**self).support_single_register_access()
    }

    fn support_breakwatch(&mut self) -> Option<ext::breakwatch::BreakwatchUnitsOps<'_>> {
        (**self).support_breakwatch()
    }

    fn support_monitor_cmd(&mut self) -> Option<ext::monitor_cmd::MonitorCmdOps<'_>> {
        (**self).support_monitor_cmd()
    }

    fn support_host_io(&mut self) -> Option<ext::host_io::HostIoOps<'_>> {
        (**self).support_host_io()
    }
}
