//! Program hardware breakpoint / watchpoint comparators.
//!
//! The driver only deals in numbered comparator units. Which units are
//! occupied, and by which breakpoint, is tracked by the
//! [`BreakwatchManager`](crate::breakwatch::BreakwatchManager) stored in
//! each target descriptor.

use crate::breakwatch::{Breakwatch, BreakwatchKind};
use crate::target::TargetResult;

/// A bank of identical comparator units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPool {
    /// Instruction address comparators (e.g: the Cortex-M FPB).
    Breakpoint,
    /// Data address comparators (e.g: the Cortex-M DWT).
    Watchpoint,
}

/// Target Extension - Hardware breakpoint / watchpoint units.
pub trait BreakwatchUnits {
    /// Which pool of units backs the given kind of breakpoint.
    ///
    /// Return `None` if this kind of breakpoint is not supported at all, in
    /// which case the `Z` request is answered with an empty reply.
    fn unit_pool(&self, kind: BreakwatchKind) -> Option<UnitPool>;

    /// Number of units in a pool.
    fn num_units(&self, pool: UnitPool) -> usize;

    /// Program `unit` to match `bw`.
    ///
    /// Return `Ok(false)` if the units cannot encode this particular
    /// breakpoint (e.g: an unsupported watch length).
    fn program_unit(&mut self, unit: usize, bw: &Breakwatch) -> TargetResult<bool>;

    /// Write the "disabled" encoding into `unit`.
    fn disable_unit(&mut self, pool: UnitPool, unit: usize) -> TargetResult<()>;
}

define_ext!(BreakwatchUnitsOps, BreakwatchUnits);
