//! Handle target-specific commands sent using GDB's `monitor` command.

use crate::target::TargetResult;

pub use crate::protocol::ConsoleOutput;
pub use crate::{output, outputln};

/// Target Extension - Handle custom GDB `monitor` commands.
pub trait MonitorCmd {
    /// Handle a `monitor` command that the stub-level handler (if any) did
    /// not recognise.
    ///
    /// For example, running `monitor erase_mass` from the GDB client will
    /// invoke `handle_monitor_cmd` with `cmd = b"erase_mass"`.
    ///
    /// Commands are _not_ guaranteed to be valid UTF-8, hence the use of
    /// `&[u8]` as opposed to `&str`.
    ///
    /// Console output can be written back to the GDB client using the
    /// provided `ConsoleOutput` object + the [`output!`](crate::output)
    /// macro. Returning an error makes GDB print `Failed`.
    fn handle_monitor_cmd(&mut self, cmd: &[u8], out: ConsoleOutput<'_>) -> TargetResult<()>;
}

define_ext!(MonitorCmdOps, MonitorCmd);
