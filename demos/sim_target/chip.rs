//! A make-believe Cortex-M3 with 64K of flash and 20K of RAM.
//!
//! There is no instruction set: a running core just advances its PC by one
//! halfword per poll, stopping on breakpoint comparators and on two
//! recognised encodings:
//!
//! - `bkpt 0xab` performs a semihosting call (`SYS_WRITE0`, `SYS_WRITE` and
//!   `SYS_EXIT` are understood),
//! - `bkpt 0x00` halts as if a software breakpoint was hit.

use std::collections::BTreeMap;

use probestub::breakwatch::{Breakwatch, BreakwatchKind};
use probestub::flash::{FlashDriver, FlashGeometry, FlashOperation, FlashRegion};
use probestub::semihosting::{HostIoReply, HostIoRequest};
use probestub::target::ext::breakwatch::{BreakwatchUnits, BreakwatchUnitsOps, UnitPool};
use probestub::target::ext::host_io::{HostIo, HostIoOps};
use probestub::target::ext::monitor_cmd::{outputln, ConsoleOutput, MonitorCmd, MonitorCmdOps};
use probestub::target::ext::single_register_access::{
    SingleRegisterAccess, SingleRegisterAccessOps,
};
use probestub::target::{
    HaltPoll, HaltReason, RegisterInfo, Target, TargetDescription, TargetError, TargetResult,
};
use probestub::TargetAddr;

pub const FLASH_START: TargetAddr = 0x0800_0000;
pub const FLASH_LEN: u32 = 0x1_0000;
pub const RAM_START: TargetAddr = 0x2000_0000;
pub const RAM_LEN: u32 = 0x5000;

const FPB_UNITS: usize = 6;
const DWT_UNITS: usize = 4;

const BKPT: u8 = 0xbe;
const SEMIHOSTING: u8 = 0xab;

const SYS_WRITE0: u32 = 0x04;
const SYS_WRITE: u32 = 0x05;
const SYS_EXIT: u32 = 0x18;

// ADP_Stopped_ApplicationExit
const EXIT_REASON: u32 = 0x20026;

/// Instructions executed per poll, so that Ctrl-C gets a chance.
const POLL_BUDGET: usize = 64;

const PC: usize = 15;

static REGS: [RegisterInfo; 17] = [
    RegisterInfo::new("r0", 32),
    RegisterInfo::new("r1", 32),
    RegisterInfo::new("r2", 32),
    RegisterInfo::new("r3", 32),
    RegisterInfo::new("r4", 32),
    RegisterInfo::new("r5", 32),
    RegisterInfo::new("r6", 32),
    RegisterInfo::new("r7", 32),
    RegisterInfo::new("r8", 32),
    RegisterInfo::new("r9", 32),
    RegisterInfo::new("r10", 32),
    RegisterInfo::new("r11", 32),
    RegisterInfo::new("r12", 32),
    RegisterInfo::new("sp", 32).with_type("data_ptr"),
    RegisterInfo::new("lr", 32),
    RegisterInfo::new("pc", 32).with_type("code_ptr"),
    RegisterInfo::new("xpsr", 32),
];

static DESC: TargetDescription = TargetDescription {
    architecture: "arm",
    feature: "org.gnu.gdb.arm.m-profile",
    registers: &REGS,
};

fn in_flash(addr: TargetAddr) -> bool {
    addr >= FLASH_START && addr - FLASH_START < FLASH_LEN
}

fn in_ram(addr: TargetAddr) -> bool {
    addr >= RAM_START && addr - RAM_START < RAM_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Halted(HaltReason),
    Running,
    Stepping,
    /// Waiting for the host to complete a semihosting call.
    HostIo,
}

pub struct SimChip {
    mem: BTreeMap<TargetAddr, u8>,
    regs: [u32; 17],
    state: RunState,
    fault: bool,
    fpb: [Option<TargetAddr>; FPB_UNITS],
    dwt: [Option<Breakwatch>; DWT_UNITS],
    cmdline: String,
    fpec: Fpec,
}

#[derive(Debug, Default)]
struct Fpec {
    unlocked: bool,
    key1_seen: bool,
    cr: u32,
    ar: u32,
    sr: u32,
}

impl SimChip {
    pub fn new() -> SimChip {
        let mut chip = SimChip {
            mem: BTreeMap::new(),
            regs: [0; 17],
            state: RunState::Halted(HaltReason::Request),
            fault: false,
            fpb: [None; FPB_UNITS],
            dwt: [None; DWT_UNITS],
            cmdline: String::new(),
            fpec: Fpec::default(),
        };
        chip.load_reset_vector();
        chip
    }

    fn read_byte(&self, addr: TargetAddr) -> Option<u8> {
        if addr & !3 == fpec::SR {
            return Some(self.fpec.sr.to_le_bytes()[(addr & 3) as usize]);
        }
        if in_flash(addr) {
            Some(*self.mem.get(&addr).unwrap_or(&0xff))
        } else if in_ram(addr) {
            Some(*self.mem.get(&addr).unwrap_or(&0))
        } else {
            None
        }
    }

    fn read_u32(&self, addr: TargetAddr) -> Option<u32> {
        let mut bytes = [0; 4];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.read_byte(addr + i as u32)?;
        }
        Some(u32::from_le_bytes(bytes))
    }

    /// Initial SP and PC come from the vector table at the start of flash.
    fn load_reset_vector(&mut self) {
        self.regs[13] = self.read_u32(FLASH_START).unwrap_or(0xffff_ffff);
        self.regs[PC] = self.read_u32(FLASH_START + 4).unwrap_or(0xffff_ffff) & !1;
        self.regs[16] = 0x0100_0000;
    }

    fn semihosting_call(&mut self) -> Result<HaltPoll, HaltReason> {
        let op = self.regs[0];
        let arg = self.regs[1];

        let req = match op {
            SYS_WRITE0 => {
                let mut len = 0;
                while self.read_byte(arg + len).ok_or(HaltReason::Fault)? != 0 {
                    len += 1;
                }
                HostIoRequest::Write {
                    fd: 1,
                    buf: arg,
                    count: len,
                }
            }
            SYS_WRITE => {
                let fd = self.read_u32(arg).ok_or(HaltReason::Fault)?;
                let buf = self.read_u32(arg + 4).ok_or(HaltReason::Fault)?;
                let count = self.read_u32(arg + 8).ok_or(HaltReason::Fault)?;
                HostIoRequest::Write {
                    fd: fd as i32,
                    buf,
                    count,
                }
            }
            SYS_EXIT => {
                let code = if arg == EXIT_REASON { 0 } else { 1 };
                return Err(HaltReason::Exited(code));
            }
            _ => {
                log::warn!("unsupported semihosting operation {:#x}", op);
                return Err(HaltReason::Breakpoint);
            }
        };

        self.state = RunState::HostIo;
        Ok(HaltPoll::HostIo(req))
    }

    fn fpec_write(&mut self, reg: u32, val: u32) {
        match reg {
            fpec::KEYR => {
                if val == fpec::KEY1 {
                    self.fpec.key1_seen = true;
                } else if val == fpec::KEY2 && self.fpec.key1_seen {
                    self.fpec.unlocked = true;
                    self.fpec.sr = 0;
                    self.fpec.cr &= !fpec::CR_LOCK;
                } else {
                    self.fpec.key1_seen = false;
                }
            }
            fpec::AR => self.fpec.ar = val,
            fpec::CR => {
                if !self.fpec.unlocked {
                    return;
                }
                self.fpec.cr = val;
                if val & fpec::CR_LOCK != 0 {
                    self.fpec = Fpec {
                        cr: fpec::CR_LOCK,
                        ..Fpec::default()
                    };
                } else if val & (fpec::CR_PER | fpec::CR_STRT) == fpec::CR_PER | fpec::CR_STRT {
                    let page = self.fpec.ar & !(fpec::PAGE_SIZE - 1);
                    if in_flash(page) {
                        for addr in page..page + fpec::PAGE_SIZE {
                            self.mem.remove(&addr);
                        }
                    } else {
                        self.fpec.sr |= fpec::SR_PGERR;
                    }
                }
            }
            _ => {}
        }
    }

    /// Execute one "instruction".
    fn step(&mut self) -> Option<HaltPoll> {
        let pc = self.regs[PC];
        let insn = match (self.read_byte(pc), self.read_byte(pc + 1)) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Some(HaltPoll::Halted(HaltReason::Fault)),
        };

        match insn {
            (SEMIHOSTING, BKPT) => {
                return Some(match self.semihosting_call() {
                    Ok(poll) => poll,
                    Err(reason) => HaltPoll::Halted(reason),
                })
            }
            (0x00, BKPT) => return Some(HaltPoll::Halted(HaltReason::Breakpoint)),
            _ => {}
        }

        self.regs[PC] = pc.wrapping_add(2);
        if self.fpb.contains(&Some(self.regs[PC])) {
            return Some(HaltPoll::Halted(HaltReason::Breakpoint));
        }
        None
    }
}

impl Target for SimChip {
    fn attach(&mut self) -> TargetResult<()> {
        self.state = RunState::Halted(HaltReason::Request);
        Ok(())
    }

    fn detach(&mut self) -> TargetResult<()> {
        self.state = RunState::Running;
        Ok(())
    }

    fn check_error(&mut self) -> bool {
        std::mem::replace(&mut self.fault, false)
    }

    fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr) {
        for (i, b) in dest.iter_mut().enumerate() {
            match self.read_byte(src.wrapping_add(i as u32)) {
                Some(val) => *b = val,
                None => {
                    self.fault = true;
                    return;
                }
            }
        }
    }

    fn mem_write(&mut self, dest: TargetAddr, src: &[u8]) {
        if (fpec::KEYR..=fpec::AR).contains(&dest) {
            let mut val = [0; 4];
            match src.get(..4) {
                Some(bytes) => val.copy_from_slice(bytes),
                None => {
                    self.fault = true;
                    return;
                }
            }
            self.fpec_write(dest, u32::from_le_bytes(val));
            return;
        }

        for (i, b) in src.iter().enumerate() {
            let addr = dest.wrapping_add(i as u32);
            if in_flash(addr) {
                if !self.fpec.unlocked || self.fpec.cr & fpec::CR_PG == 0 {
                    self.fault = true;
                    return;
                }
                // programming can only clear bits
                let old = *self.mem.get(&addr).unwrap_or(&0xff);
                if old != 0xff && old != *b {
                    self.fpec.sr |= fpec::SR_PGERR;
                }
                self.mem.insert(addr, old & *b);
            } else if in_ram(addr) {
                self.mem.insert(addr, *b);
            } else {
                self.fault = true;
                return;
            }
        }
    }

    fn description(&self) -> &'static TargetDescription {
        &DESC
    }

    fn reset(&mut self) -> TargetResult<()> {
        self.regs = [0; 17];
        self.load_reset_vector();
        if self.state != RunState::Running {
            self.state = RunState::Halted(HaltReason::Request);
        }
        Ok(())
    }

    fn halt_request(&mut self) -> TargetResult<()> {
        if self.state == RunState::Running {
            self.state = RunState::Halted(HaltReason::Request);
        }
        Ok(())
    }

    fn halt_poll(&mut self) -> TargetResult<HaltPoll> {
        match self.state {
            RunState::Halted(reason) => return Ok(HaltPoll::Halted(reason)),
            RunState::HostIo => return Ok(HaltPoll::Running),
            RunState::Stepping => {
                let poll = self
                    .step()
                    .unwrap_or(HaltPoll::Halted(HaltReason::Stepping));
                if let HaltPoll::Halted(reason) = poll {
                    self.state = RunState::Halted(reason);
                }
                return Ok(poll);
            }
            RunState::Running => {}
        }

        for _ in 0..POLL_BUDGET {
            if let Some(poll) = self.step() {
                if let HaltPoll::Halted(reason) = poll {
                    self.state = RunState::Halted(reason);
                }
                return Ok(poll);
            }
        }
        Ok(HaltPoll::Running)
    }

    fn halt_resume(&mut self, step: bool) -> TargetResult<()> {
        self.state = if step {
            RunState::Stepping
        } else {
            RunState::Running
        };
        Ok(())
    }

    fn set_cmdline(&mut self, cmdline: &str) {
        self.cmdline = cmdline.to_string();
    }

    fn support_single_register_access(&mut self) -> Option<SingleRegisterAccessOps<'_>> {
        Some(self)
    }

    fn support_breakwatch(&mut self) -> Option<BreakwatchUnitsOps<'_>> {
        Some(self)
    }

    fn support_monitor_cmd(&mut self) -> Option<MonitorCmdOps<'_>> {
        Some(self)
    }

    fn support_host_io(&mut self) -> Option<HostIoOps<'_>> {
        Some(self)
    }
}

impl SingleRegisterAccess for SimChip {
    fn read_register(&mut self, reg_id: usize, buf: &mut [u8]) -> TargetResult<usize> {
        let val = self.regs.get(reg_id).ok_or(TargetError::NonFatal)?;
        buf.get_mut(..4)
            .ok_or(TargetError::NonFatal)?
            .copy_from_slice(&val.to_le_bytes());
        Ok(4)
    }

    fn write_register(&mut self, reg_id: usize, val: &[u8]) -> TargetResult<()> {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(val.get(..4).ok_or(TargetError::NonFatal)?);
        *self.regs.get_mut(reg_id).ok_or(TargetError::NonFatal)? = u32::from_le_bytes(bytes);
        Ok(())
    }
}

impl BreakwatchUnits for SimChip {
    fn unit_pool(&self, kind: BreakwatchKind) -> Option<UnitPool> {
        match kind {
            BreakwatchKind::Soft | BreakwatchKind::Hard => Some(UnitPool::Breakpoint),
            _ => Some(UnitPool::Watchpoint),
        }
    }

    fn num_units(&self, pool: UnitPool) -> usize {
        match pool {
            UnitPool::Breakpoint => FPB_UNITS,
            UnitPool::Watchpoint => DWT_UNITS,
        }
    }

    fn program_unit(&mut self, unit: usize, bw: &Breakwatch) -> TargetResult<bool> {
        if bw.kind.is_watchpoint() {
            // DWT comparators mask the low address bits
            if !bw.size.is_power_of_two() || bw.addr as usize % bw.size != 0 {
                return Ok(false);
            }
            self.dwt[unit] = Some(*bw);
        } else {
            // the FPB only covers the code region
            if bw.addr >= 0x2000_0000 {
                return Ok(false);
            }
            self.fpb[unit] = Some(bw.addr);
        }
        Ok(true)
    }

    fn disable_unit(&mut self, pool: UnitPool, unit: usize) -> TargetResult<()> {
        match pool {
            UnitPool::Breakpoint => self.fpb[unit] = None,
            UnitPool::Watchpoint => self.dwt[unit] = None,
        }
        Ok(())
    }
}

impl MonitorCmd for SimChip {
    fn handle_monitor_cmd(&mut self, cmd: &[u8], mut out: ConsoleOutput<'_>) -> TargetResult<()> {
        match cmd {
            b"reset" => {
                self.reset()?;
                outputln!(out, "reset to pc={:#010x}", self.regs[PC]);
            }
            b"cmdline" => outputln!(out, "{:?}", self.cmdline),
            b"watch" => {
                for bw in self.dwt.iter().flatten() {
                    outputln!(out, "{:?} at {:#010x}+{}", bw.kind, bw.addr, bw.size);
                }
            }
            _ => return Err(TargetError::NonFatal),
        }
        Ok(())
    }
}

impl HostIo for SimChip {
    fn syscall_reply(&mut self, reply: HostIoReply) -> TargetResult<()> {
        // SYS_WRITE returns the number of bytes *not* written
        let count = self.regs[1]
            .checked_add(8)
            .and_then(|addr| self.read_u32(addr))
            .unwrap_or(0);
        self.regs[0] = match self.regs[0] {
            SYS_WRITE if reply.retcode >= 0 => count.saturating_sub(reply.retcode as u32),
            _ => reply.retcode as u32,
        };
        self.regs[PC] = self.regs[PC].wrapping_add(2);
        self.state = RunState::Halted(HaltReason::Request);
        Ok(())
    }
}

/// STM32F1-style flash controller (FPEC) registers.
mod fpec {
    pub const KEYR: u32 = 0x4002_2004;
    pub const SR: u32 = 0x4002_200c;
    pub const CR: u32 = 0x4002_2010;
    pub const AR: u32 = 0x4002_2014;

    pub const KEY1: u32 = 0x4567_0123;
    pub const KEY2: u32 = 0xcdef_89ab;

    pub const CR_PG: u32 = 1 << 0;
    pub const CR_PER: u32 = 1 << 1;
    pub const CR_STRT: u32 = 1 << 6;
    pub const CR_LOCK: u32 = 1 << 7;

    pub const SR_PGERR: u32 = 1 << 2;

    pub const PAGE_SIZE: u32 = 0x400;
}

pub fn flash_region() -> FlashRegion {
    FlashRegion::new(FLASH_START, FLASH_LEN, fpec::PAGE_SIZE, 2, 0xff, Box::new(SimFlash))
}

/// Drives the FPEC through the debug port, like the real thing.
struct SimFlash;

fn write_reg(target: &mut dyn Target, reg: u32, val: u32) -> TargetResult<()> {
    target.mem_write(reg, &val.to_le_bytes());
    if target.check_error() {
        return Err(TargetError::NonFatal);
    }
    Ok(())
}

fn read_reg(target: &mut dyn Target, reg: u32) -> TargetResult<u32> {
    let mut buf = [0; 4];
    target.mem_read(&mut buf, reg);
    if target.check_error() {
        return Err(TargetError::NonFatal);
    }
    Ok(u32::from_le_bytes(buf))
}

fn check_status(target: &mut dyn Target) -> TargetResult<()> {
    if read_reg(target, fpec::SR)? & fpec::SR_PGERR != 0 {
        return Err(TargetError::NonFatal);
    }
    Ok(())
}

impl FlashDriver for SimFlash {
    fn prepare(
        &mut self,
        target: &mut dyn Target,
        _region: &FlashGeometry,
        op: FlashOperation,
    ) -> TargetResult<()> {
        write_reg(target, fpec::KEYR, fpec::KEY1)?;
        write_reg(target, fpec::KEYR, fpec::KEY2)?;
        if op == FlashOperation::Write {
            write_reg(target, fpec::CR, fpec::CR_PG)?;
        }
        Ok(())
    }

    fn erase(
        &mut self,
        target: &mut dyn Target,
        _region: &FlashGeometry,
        addr: TargetAddr,
        _len: u32,
    ) -> TargetResult<()> {
        write_reg(target, fpec::CR, fpec::CR_PER)?;
        write_reg(target, fpec::AR, addr)?;
        write_reg(target, fpec::CR, fpec::CR_PER | fpec::CR_STRT)?;
        check_status(target)
    }

    fn write(
        &mut self,
        target: &mut dyn Target,
        _region: &FlashGeometry,
        dest: TargetAddr,
        src: &[u8],
    ) -> TargetResult<()> {
        target.mem_write(dest, src);
        if target.check_error() {
            return Err(TargetError::NonFatal);
        }
        check_status(target)
    }

    fn done(&mut self, target: &mut dyn Target, _region: &FlashGeometry) -> TargetResult<()> {
        write_reg(target, fpec::CR, fpec::CR_LOCK)
    }
}
