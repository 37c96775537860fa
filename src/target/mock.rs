//! A do-nothing target for unit tests.

use alloc::collections::BTreeMap;

use super::{HaltPoll, RegisterInfo, Target, TargetDescription, TargetResult};
use crate::TargetAddr;

static REGS: [RegisterInfo; 2] = [RegisterInfo::new("r0", 32), RegisterInfo::new("pc", 32)];

pub static DESC: TargetDescription = TargetDescription {
    architecture: "arm",
    feature: "org.gnu.gdb.arm.m-profile",
    registers: &REGS,
};

/// Sparse byte-addressed memory, which counts resets.
#[derive(Debug, Default)]
pub struct NullTarget {
    pub mem: BTreeMap<TargetAddr, u8>,
    pub resets: usize,
    pub faulted: bool,
}

impl Target for NullTarget {
    fn check_error(&mut self) -> bool {
        core::mem::replace(&mut self.faulted, false)
    }

    fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr) {
        for (i, b) in dest.iter_mut().enumerate() {
            *b = *self.mem.get(&(src + i as u32)).unwrap_or(&0);
        }
    }

    fn mem_write(&mut self, dest: TargetAddr, src: &[u8]) {
        for (i, b) in src.iter().enumerate() {
            self.mem.insert(dest + i as u32, *b);
        }
    }

    fn description(&self) -> &'static TargetDescription {
        &DESC
    }

    fn reset(&mut self) -> TargetResult<()> {
        self.resets += 1;
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
}
