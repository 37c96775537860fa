//! Support for single-register read/write access.

use crate::target::TargetResult;

/// Target Extension - Support for single-register access.
///
/// Required for `p` / `P` packets. Without it, `p` replies with `xx` filler
/// ("register unavailable") and `P` replies with an empty packet, which
/// makes GDB fall back to the bulk `g` / `G` packets.
///
/// When a driver implements this extension but not
/// [`Target::regs_read`](crate::target::Target::regs_read) /
/// [`Target::regs_write`](crate::target::Target::regs_write), the bulk
/// operations are emulated with one call per register.
pub trait SingleRegisterAccess {
    /// Read a single register, identified by its index in the target's
    /// [`TargetDescription`](crate::target::TargetDescription).
    ///
    /// Implementations should write the value of the register using the
    /// target's native byte order, and return the number of bytes written
    /// into `buf`.
    fn read_register(&mut self, reg_id: usize, buf: &mut [u8]) -> TargetResult<usize>;

    /// Write a single register, identified by its index in the target's
    /// [`TargetDescription`](crate::target::TargetDescription).
    ///
    /// `val` holds the new value in the target's native byte order.
    fn write_register(&mut self, reg_id: usize, val: &[u8]) -> TargetResult<()>;
}

define_ext!(SingleRegisterAccessOps, SingleRegisterAccess);
