//! Bookkeeping for hardware breakpoints and watchpoints.
//!
//! Each target has a handful of comparator units (commonly 6 instruction
//! comparators and 4 data comparators on Cortex-M). The
//! [`BreakwatchManager`] records which unit holds which breakpoint, so that
//! a `z` packet can find the unit to release, and so that every unit can be
//! returned to a known-disabled state at attach / detach time.
//!
//! The driver side of this lives in
//! [`target::ext::breakwatch`](crate::target::ext::breakwatch).

use crate::target::ext::breakwatch::UnitPool;
use crate::target::{Target, TargetResult};
use crate::TargetAddr;

/// Maximum number of units tracked per pool.
///
/// Comparators beyond this count are never handed out, even if the driver
/// reports more.
pub const MAX_UNITS: usize = 16;

/// The kind of breakpoint requested by a `Z` / `z` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakwatchKind {
    /// `Z0`: software breakpoint.
    Soft,
    /// `Z1`: hardware breakpoint.
    Hard,
    /// `Z2`: fire when the memory location is written to.
    WatchWrite,
    /// `Z3`: fire when the memory location is read from.
    WatchRead,
    /// `Z4`: fire when the memory location is read from or written to.
    WatchAccess,
}

impl BreakwatchKind {
    /// Decode the `type` field of a `Z` / `z` packet.
    pub fn from_packet_type(type_: u8) -> Option<BreakwatchKind> {
        let kind = match type_ {
            0 => BreakwatchKind::Soft,
            1 => BreakwatchKind::Hard,
            2 => BreakwatchKind::WatchWrite,
            3 => BreakwatchKind::WatchRead,
            4 => BreakwatchKind::WatchAccess,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this is a data watchpoint (as opposed to a breakpoint).
    pub fn is_watchpoint(self) -> bool {
        !matches!(self, BreakwatchKind::Soft | BreakwatchKind::Hard)
    }
}

/// A live breakpoint / watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakwatch {
    /// What kind of event this is.
    pub kind: BreakwatchKind,
    /// Instruction or data address.
    pub addr: TargetAddr,
    /// Breakpoint kind / watched length, as sent by GDB.
    pub size: usize,
    /// The comparator unit holding this breakpoint.
    pub reservation: usize,
}

impl Breakwatch {
    fn matches(&self, kind: BreakwatchKind, addr: TargetAddr, size: usize) -> bool {
        self.kind == kind && self.addr == addr && self.size == size
    }
}

/// Outcome of a [`BreakwatchManager`] request, in the terms used by `Z`/`z`
/// replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakwatchStatus {
    /// The request succeeded (`OK`).
    Ok,
    /// The target can't do this kind of breakpoint (empty reply).
    Unsupported,
    /// Every unit in the pool is in use (`E01`).
    Exhausted,
    /// No live breakpoint matches the key being cleared (`E01`).
    NotFound,
}

/// Tracks which comparator unit holds which [`Breakwatch`].
#[derive(Debug, Clone)]
pub struct BreakwatchManager {
    breakpoints: [Option<Breakwatch>; MAX_UNITS],
    watchpoints: [Option<Breakwatch>; MAX_UNITS],
}

impl Default for BreakwatchManager {
    fn default() -> Self {
        BreakwatchManager::new()
    }
}

impl BreakwatchManager {
    /// Create a manager with every unit free.
    pub fn new() -> BreakwatchManager {
        BreakwatchManager {
            breakpoints: [None; MAX_UNITS],
            watchpoints: [None; MAX_UNITS],
        }
    }

    fn units(&self, pool: UnitPool) -> &[Option<Breakwatch>; MAX_UNITS] {
        match pool {
            UnitPool::Breakpoint => &self.breakpoints,
            UnitPool::Watchpoint => &self.watchpoints,
        }
    }

    fn units_mut(&mut self, pool: UnitPool) -> &mut [Option<Breakwatch>; MAX_UNITS] {
        match pool {
            UnitPool::Breakpoint => &mut self.breakpoints,
            UnitPool::Watchpoint => &mut self.watchpoints,
        }
    }

    fn find(
        &self,
        kind: BreakwatchKind,
        addr: TargetAddr,
        size: usize,
    ) -> Option<(UnitPool, usize)> {
        [UnitPool::Breakpoint, UnitPool::Watchpoint]
            .iter()
            .find_map(|&pool| {
                self.units(pool)
                    .iter()
                    .position(|slot| matches!(slot, Some(bw) if bw.matches(kind, addr, size)))
                    .map(|unit| (pool, unit))
            })
    }

    /// Iterate over all live breakpoints / watchpoints.
    pub fn iter(&self) -> impl Iterator<Item = &Breakwatch> {
        self.breakpoints
            .iter()
            .chain(self.watchpoints.iter())
            .filter_map(Option::as_ref)
    }

    /// Number of live breakpoints / watchpoints.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `true` if no unit is in use.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve and program a unit for `(kind, addr, size)`.
    ///
    /// Setting a key which is already live is a no-op.
    pub fn set(
        &mut self,
        target: &mut dyn Target,
        kind: BreakwatchKind,
        addr: TargetAddr,
        size: usize,
    ) -> TargetResult<BreakwatchStatus> {
        if self.find(kind, addr, size).is_some() {
            return Ok(BreakwatchStatus::Ok);
        }

        let ops = match target.support_breakwatch() {
            Some(ops) => ops,
            None => return Ok(BreakwatchStatus::Unsupported),
        };
        let pool = match ops.unit_pool(kind) {
            Some(pool) => pool,
            None => return Ok(BreakwatchStatus::Unsupported),
        };

        let num_units = ops.num_units(pool).min(MAX_UNITS);
        let unit = match self.units(pool)[..num_units]
            .iter()
            .position(Option::is_none)
        {
            Some(unit) => unit,
            None => {
                debug!("no free {:?} unit for {:?} @ {:#010x}", pool, kind, addr);
                return Ok(BreakwatchStatus::Exhausted);
            }
        };

        let bw = Breakwatch {
            kind,
            addr,
            size,
            reservation: unit,
        };
        if !ops.program_unit(unit, &bw)? {
            return Ok(BreakwatchStatus::Unsupported);
        }

        self.units_mut(pool)[unit] = Some(bw);
        Ok(BreakwatchStatus::Ok)
    }

    /// Release the unit holding `(kind, addr, size)`.
    pub fn clear(
        &mut self,
        target: &mut dyn Target,
        kind: BreakwatchKind,
        addr: TargetAddr,
        size: usize,
    ) -> TargetResult<BreakwatchStatus> {
        let (pool, unit) = match self.find(kind, addr, size) {
            Some(slot) => slot,
            None => return Ok(BreakwatchStatus::NotFound),
        };

        let ops = match target.support_breakwatch() {
            Some(ops) => ops,
            None => return Ok(BreakwatchStatus::Unsupported),
        };
        ops.disable_unit(pool, unit)?;

        self.units_mut(pool)[unit] = None;
        Ok(BreakwatchStatus::Ok)
    }

    /// Forget every record, and write the disabled encoding into every unit
    /// the target has (not just the ones in use).
    pub fn reset(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        self.breakpoints = [None; MAX_UNITS];
        self.watchpoints = [None; MAX_UNITS];

        let ops = match target.support_breakwatch() {
            Some(ops) => ops,
            None => return Ok(()),
        };
        for &pool in &[UnitPool::Breakpoint, UnitPool::Watchpoint] {
            for unit in 0..ops.num_units(pool).min(MAX_UNITS) {
                ops.disable_unit(pool, unit)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::target::ext::breakwatch::{BreakwatchUnits, BreakwatchUnitsOps};
    use crate::target::{HaltPoll, TargetDescription};

    static DESC: TargetDescription = TargetDescription {
        architecture: "arm",
        feature: "org.gnu.gdb.arm.m-profile",
        registers: &[],
    };

    #[derive(Default)]
    struct Comparators {
        fpb: [Option<u32>; 2],
        dwt: [Option<u32>; 1],
        disables: usize,
    }

    impl Target for Comparators {
        fn check_error(&mut self) -> bool {
            false
        }
        fn mem_read(&mut self, _dest: &mut [u8], _src: TargetAddr) {}
        fn mem_write(&mut self, _dest: TargetAddr, _src: &[u8]) {}
        fn description(&self) -> &'static TargetDescription {
            &DESC
        }
        fn reset(&mut self) -> TargetResult<()> {
            Ok(())
        }
        fn halt_request(&mut self) -> TargetResult<()> {
            Ok(())
        }
        fn halt_poll(&mut self) -> TargetResult<HaltPoll> {
            Ok(HaltPoll::Running)
        }
        fn halt_resume(&mut self, _step: bool) -> TargetResult<()> {
            Ok(())
        }
        fn support_breakwatch(&mut self) -> Option<BreakwatchUnitsOps<'_>> {
            Some(self)
        }
    }

    impl BreakwatchUnits for Comparators {
        fn unit_pool(&self, kind: BreakwatchKind) -> Option<UnitPool> {
            match kind {
                BreakwatchKind::Soft => None,
                BreakwatchKind::Hard => Some(UnitPool::Breakpoint),
                _ => Some(UnitPool::Watchpoint),
            }
        }

        fn num_units(&self, pool: UnitPool) -> usize {
            match pool {
                UnitPool::Breakpoint => self.fpb.len(),
                UnitPool::Watchpoint => self.dwt.len(),
            }
        }

        fn program_unit(&mut self, unit: usize, bw: &Breakwatch) -> TargetResult<bool> {
            if bw.kind.is_watchpoint() {
                // only word-sized watches
                if bw.size != 4 {
                    return Ok(false);
                }
                self.dwt[unit] = Some(bw.addr);
            } else {
                self.fpb[unit] = Some(bw.addr);
            }
            Ok(true)
        }

        fn disable_unit(&mut self, pool: UnitPool, unit: usize) -> TargetResult<()> {
            self.disables += 1;
            match pool {
                UnitPool::Breakpoint => self.fpb[unit] = None,
                UnitPool::Watchpoint => self.dwt[unit] = None,
            }
            Ok(())
        }
    }

    #[test]
    fn set_then_clear() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        let res = bw.set(&mut t, BreakwatchKind::Hard, 0x0800_0100, 2);
        assert_eq!(res, Ok(BreakwatchStatus::Ok));
        assert_eq!(t.fpb, [Some(0x0800_0100), None]);
        assert_eq!(bw.len(), 1);

        let res = bw.clear(&mut t, BreakwatchKind::Hard, 0x0800_0100, 2);
        assert_eq!(res, Ok(BreakwatchStatus::Ok));
        assert_eq!(t.fpb, [None, None]);
        assert!(bw.is_empty());
    }

    #[test]
    fn exhaustion_keeps_existing_units() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        for addr in &[0x100, 0x200] {
            let res = bw.set(&mut t, BreakwatchKind::Hard, *addr, 2);
            assert_eq!(res, Ok(BreakwatchStatus::Ok));
        }
        let res = bw.set(&mut t, BreakwatchKind::Hard, 0x300, 2);
        assert_eq!(res, Ok(BreakwatchStatus::Exhausted));
        assert_eq!(t.fpb, [Some(0x100), Some(0x200)]);
    }

    #[test]
    fn duplicate_set_is_idempotent() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        bw.set(&mut t, BreakwatchKind::Hard, 0x100, 2).unwrap();
        bw.set(&mut t, BreakwatchKind::Hard, 0x100, 2).unwrap();
        assert_eq!(bw.len(), 1);
        assert_eq!(t.fpb, [Some(0x100), None]);
    }

    #[test]
    fn clear_requires_exact_key() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        bw.set(&mut t, BreakwatchKind::WatchWrite, 0x2000_0000, 4)
            .unwrap();

        let res = bw.clear(&mut t, BreakwatchKind::WatchRead, 0x2000_0000, 4);
        assert_eq!(res, Ok(BreakwatchStatus::NotFound));
        let res = bw.clear(&mut t, BreakwatchKind::WatchWrite, 0x2000_0000, 2);
        assert_eq!(res, Ok(BreakwatchStatus::NotFound));
        assert_eq!(bw.len(), 1);
    }

    #[test]
    fn unsupported_kinds() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        let res = bw.set(&mut t, BreakwatchKind::Soft, 0x100, 2);
        assert_eq!(res, Ok(BreakwatchStatus::Unsupported));
        let res = bw.set(&mut t, BreakwatchKind::WatchAccess, 0x100, 1);
        assert_eq!(res, Ok(BreakwatchStatus::Unsupported));
        assert!(bw.is_empty());
    }

    #[test]
    fn reset_disables_every_unit() {
        let mut t = Comparators::default();
        let mut bw = BreakwatchManager::new();

        bw.set(&mut t, BreakwatchKind::Hard, 0x100, 2).unwrap();
        bw.reset(&mut t).unwrap();

        assert!(bw.is_empty());
        assert_eq!(t.fpb, [None, None]);
        assert_eq!(t.disables, 3);
    }

    #[test]
    fn packet_types() {
        assert_eq!(BreakwatchKind::from_packet_type(0), Some(BreakwatchKind::Soft));
        assert_eq!(
            BreakwatchKind::from_packet_type(4),
            Some(BreakwatchKind::WatchAccess)
        );
        assert_eq!(BreakwatchKind::from_packet_type(5), None);
    }
}
