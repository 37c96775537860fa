//! Shared fixtures: a scripted connection, and a Cortex-M-like mock chip with
//! sparse memory, comparator units, and a recording flash driver.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use probestub::breakwatch::{Breakwatch, BreakwatchKind};
use probestub::conn::{Connection, ConnectionExt};
use probestub::flash::{FlashDriver, FlashGeometry, FlashOperation, FlashRegion};
use probestub::outputln;
use probestub::registry::{TargetDescriptor, TargetRegistry};
use probestub::semihosting::HostIoReply;
use probestub::stub::{ProbeStub, ProbeStubError};
use probestub::target::ext::breakwatch::{BreakwatchUnits, BreakwatchUnitsOps, UnitPool};
use probestub::target::ext::host_io::{HostIo, HostIoOps};
use probestub::target::ext::monitor_cmd::{ConsoleOutput, MonitorCmd, MonitorCmdOps};
use probestub::target::ext::single_register_access::{
    SingleRegisterAccess, SingleRegisterAccessOps,
};
use probestub::target::{
    HaltPoll, HaltReason, RegisterInfo, Target, TargetDescription, TargetError, TargetResult,
};
use probestub::TargetAddr;

pub const RAM_START: TargetAddr = 0x2000_0000;
pub const RAM_LEN: u32 = 0x5000;
pub const FLASH_START: TargetAddr = 0x0800_0000;
pub const FLASH_LEN: u32 = 0x1_0000;
pub const FLASH_BLOCK: u32 = 0x400;

pub const BREAKPOINT_UNITS: usize = 2;
pub const WATCHPOINT_UNITS: usize = 1;

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// `$<body>#<checksum>`
pub fn packet(body: &[u8]) -> Vec<u8> {
    let checksum = body.iter().fold(0u8, |a, b| a.wrapping_add(*b));
    let mut pkt = vec![b'$'];
    pkt.extend_from_slice(body);
    pkt.extend_from_slice(format!("#{:02x}", checksum).as_bytes());
    pkt
}

/// Escape data for the binary packets (`X`, `vFlashWrite`).
pub fn escape_binary(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for &b in data {
        match b {
            b'#' | b'$' | b'}' | b'*' => {
                out.push(b'}');
                out.push(b ^ 0x20);
            }
            _ => out.push(b),
        }
    }
    out
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Split the stub's output into acks (`+`, `-`), packets (`$body`) and
/// notifications (`%body`).
pub fn split_output(out: &[u8]) -> Vec<String> {
    let mut items = Vec::new();
    let mut i = 0;
    while i < out.len() {
        match out[i] {
            b'+' | b'-' => {
                items.push((out[i] as char).to_string());
                i += 1;
            }
            header @ b'$' | header @ b'%' => {
                let end = i + out[i..].iter().position(|b| *b == b'#').unwrap();
                let mut item = (header as char).to_string();
                item.push_str(&String::from_utf8_lossy(&out[i + 1..end]));
                items.push(item);
                // skip the checksum
                i = end + 3;
            }
            other => panic!("unexpected byte {:#04x} in output", other),
        }
    }
    items
}

/// Packets only, without the `$`, in the order they were sent.
pub fn replies(out: &[u8]) -> Vec<String> {
    split_output(out)
        .into_iter()
        .filter_map(|item| item.strip_prefix('$').map(String::from))
        .collect()
}

#[derive(Debug, PartialEq)]
pub struct Eof;

/// Plays back a fixed input script, and records everything written.
///
/// Reading past the end of the script fails, which ends `run_blocking`.
#[derive(Default)]
pub struct ScriptConn {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl ScriptConn {
    pub fn new(script: &[u8]) -> ScriptConn {
        ScriptConn {
            input: script.iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl Connection for ScriptConn {
    type Error = Eof;

    fn write(&mut self, byte: u8) -> Result<(), Eof> {
        self.output.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Eof> {
        Ok(())
    }
}

impl ConnectionExt for ScriptConn {
    fn read(&mut self) -> Result<u8, Eof> {
        self.input.pop_front().ok_or(Eof)
    }

    fn peek(&mut self) -> Result<Option<u8>, Eof> {
        Ok(self.input.front().copied())
    }
}

/// Build a script out of packet bodies.
pub fn script(bodies: &[&[u8]]) -> Vec<u8> {
    bodies.iter().flat_map(|body| packet(body)).collect()
}

/// Serve `script` until it runs out, returning the raw output.
pub fn run(registry: &mut TargetRegistry, script: &[u8]) -> Vec<u8> {
    let mut stub = ProbeStub::new(ScriptConn::new(script));
    run_stub(&mut stub, registry)
}

pub fn run_stub(stub: &mut ProbeStub<'_, ScriptConn>, registry: &mut TargetRegistry) -> Vec<u8> {
    init_logging();
    match stub.run_blocking(registry) {
        ProbeStubError::ConnectionRead(Eof) => {}
        e => panic!("session ended with {:?}", e),
    }
    std::mem::take(&mut stub.borrow_conn().output)
}

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

pub static DESC: TargetDescription = TargetDescription {
    architecture: "arm",
    feature: "org.gnu.gdb.arm.m-profile",
    registers: &REGS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashEvent {
    Prepare(FlashOperation),
    Erase(TargetAddr, u32),
    Write(TargetAddr, u32),
    Done,
}

/// Everything a test may want to script or inspect. Shared between the test
/// and the boxed chip driver owned by the registry.
#[derive(Debug)]
pub struct ChipState {
    pub mem: BTreeMap<TargetAddr, u8>,
    pub faulted: bool,
    pub regs: [u32; 17],

    pub running: bool,
    pub last_halt: HaltReason,
    /// Results of `halt_poll` while running. Once empty, the core keeps
    /// running.
    pub polls: VecDeque<TargetResult<HaltPoll>>,
    pub halt_requests: usize,
    pub resumes: Vec<bool>,
    pub resets: usize,

    pub attach_ok: bool,
    pub detach_ok: bool,
    pub attaches: usize,
    pub detaches: usize,

    pub breakpoints: [Option<Breakwatch>; BREAKPOINT_UNITS],
    pub watchpoints: [Option<Breakwatch>; WATCHPOINT_UNITS],

    pub flash_log: Vec<FlashEvent>,
    pub fail_flash_erase: bool,
    pub fail_flash_write: bool,

    pub host_io_replies: Vec<HostIoReply>,
    pub cmdline: String,
    pub monitor_cmds: Vec<Vec<u8>>,
}

impl Default for ChipState {
    fn default() -> ChipState {
        ChipState {
            mem: BTreeMap::new(),
            faulted: false,
            regs: [0; 17],
            running: false,
            last_halt: HaltReason::Request,
            polls: VecDeque::new(),
            halt_requests: 0,
            resumes: Vec::new(),
            resets: 0,
            attach_ok: true,
            detach_ok: true,
            attaches: 0,
            detaches: 0,
            breakpoints: [None; BREAKPOINT_UNITS],
            watchpoints: [None; WATCHPOINT_UNITS],
            flash_log: Vec::new(),
            fail_flash_erase: false,
            fail_flash_write: false,
            host_io_replies: Vec::new(),
            cmdline: String::new(),
            monitor_cmds: Vec::new(),
        }
    }
}

pub type Shared = Rc<RefCell<ChipState>>;

fn mapped(addr: TargetAddr) -> bool {
    (addr >= RAM_START && addr - RAM_START < RAM_LEN)
        || (addr >= FLASH_START && addr - FLASH_START < FLASH_LEN)
}

pub struct MockChip(pub Shared);

impl Target for MockChip {
    fn attach(&mut self) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.attaches += 1;
        if !s.attach_ok {
            return Err(TargetError::NonFatal);
        }
        s.running = false;
        Ok(())
    }

    fn detach(&mut self) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.detaches += 1;
        if !s.detach_ok {
            return Err(TargetError::NonFatal);
        }
        Ok(())
    }

    fn check_error(&mut self) -> bool {
        std::mem::replace(&mut self.0.borrow_mut().faulted, false)
    }

    fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr) {
        let mut s = self.0.borrow_mut();
        for (i, b) in dest.iter_mut().enumerate() {
            let addr = src.wrapping_add(i as u32);
            if !mapped(addr) {
                s.faulted = true;
                return;
            }
            *b = *s.mem.get(&addr).unwrap_or(&0);
        }
    }

    fn mem_write(&mut self, dest: TargetAddr, src: &[u8]) {
        let mut s = self.0.borrow_mut();
        for (i, b) in src.iter().enumerate() {
            let addr = dest.wrapping_add(i as u32);
            if !mapped(addr) {
                s.faulted = true;
                return;
            }
            s.mem.insert(addr, *b);
        }
    }

    fn description(&self) -> &'static TargetDescription {
        &DESC
    }

    fn reset(&mut self) -> TargetResult<()> {
        self.0.borrow_mut().resets += 1;
        Ok(())
    }

    fn halt_request(&mut self) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.halt_requests += 1;
        if s.running {
            s.polls.push_front(Ok(HaltPoll::Halted(HaltReason::Request)));
        }
        Ok(())
    }

    fn halt_poll(&mut self) -> TargetResult<HaltPoll> {
        let mut s = self.0.borrow_mut();
        if !s.running {
            return Ok(HaltPoll::Halted(s.last_halt));
        }
        match s.polls.pop_front() {
            None => Ok(HaltPoll::Running),
            Some(Ok(HaltPoll::Halted(reason))) => {
                s.running = false;
                s.last_halt = reason;
                Ok(HaltPoll::Halted(reason))
            }
            Some(Ok(HaltPoll::HostIo(req))) => {
                s.running = false;
                Ok(HaltPoll::HostIo(req))
            }
            Some(other) => other,
        }
    }

    fn halt_resume(&mut self, step: bool) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.resumes.push(step);
        s.running = true;
        if step && s.polls.is_empty() {
            s.polls.push_back(Ok(HaltPoll::Halted(HaltReason::Stepping)));
        }
        Ok(())
    }

    fn set_cmdline(&mut self, cmdline: &str) {
        self.0.borrow_mut().cmdline = cmdline.to_string();
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

impl SingleRegisterAccess for MockChip {
    fn read_register(&mut self, reg_id: usize, buf: &mut [u8]) -> TargetResult<usize> {
        let val = *self.0.borrow().regs.get(reg_id).ok_or(TargetError::NonFatal)?;
        buf[..4].copy_from_slice(&val.to_le_bytes());
        Ok(4)
    }

    fn write_register(&mut self, reg_id: usize, val: &[u8]) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        let reg = s.regs.get_mut(reg_id).ok_or(TargetError::NonFatal)?;
        let mut bytes = [0; 4];
        bytes.copy_from_slice(val.get(..4).ok_or(TargetError::NonFatal)?);
        *reg = u32::from_le_bytes(bytes);
        Ok(())
    }
}

impl BreakwatchUnits for MockChip {
    fn unit_pool(&self, kind: BreakwatchKind) -> Option<UnitPool> {
        match kind {
            BreakwatchKind::Soft | BreakwatchKind::Hard => Some(UnitPool::Breakpoint),
            BreakwatchKind::WatchWrite | BreakwatchKind::WatchAccess => {
                Some(UnitPool::Watchpoint)
            }
            // the DWT of this part can't match reads alone
            BreakwatchKind::WatchRead => None,
        }
    }

    fn num_units(&self, pool: UnitPool) -> usize {
        match pool {
            UnitPool::Breakpoint => BREAKPOINT_UNITS,
            UnitPool::Watchpoint => WATCHPOINT_UNITS,
        }
    }

    fn program_unit(&mut self, unit: usize, bw: &Breakwatch) -> TargetResult<bool> {
        let mut s = self.0.borrow_mut();
        if bw.kind.is_watchpoint() {
            // comparators only match power-of-two lengths
            if !bw.size.is_power_of_two() {
                return Ok(false);
            }
            s.watchpoints[unit] = Some(*bw);
        } else {
            s.breakpoints[unit] = Some(*bw);
        }
        Ok(true)
    }

    fn disable_unit(&mut self, pool: UnitPool, unit: usize) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        match pool {
            UnitPool::Breakpoint => s.breakpoints[unit] = None,
            UnitPool::Watchpoint => s.watchpoints[unit] = None,
        }
        Ok(())
    }
}

impl MonitorCmd for MockChip {
    fn handle_monitor_cmd(&mut self, cmd: &[u8], mut out: ConsoleOutput<'_>) -> TargetResult<()> {
        self.0.borrow_mut().monitor_cmds.push(cmd.to_vec());
        match cmd {
            b"hello" => {
                outputln!(out, "hello from the target");
                Ok(())
            }
            b"lockup" => Err(TargetError::Fatal("debug port stopped responding")),
            _ => Err(TargetError::NonFatal),
        }
    }
}

impl HostIo for MockChip {
    fn syscall_reply(&mut self, reply: HostIoReply) -> TargetResult<()> {
        self.0.borrow_mut().host_io_replies.push(reply);
        Ok(())
    }
}

/// Records every call, and programs the shared memory model.
pub struct MockFlash(pub Shared);

impl FlashDriver for MockFlash {
    fn prepare(
        &mut self,
        _target: &mut dyn Target,
        _region: &FlashGeometry,
        op: FlashOperation,
    ) -> TargetResult<()> {
        self.0.borrow_mut().flash_log.push(FlashEvent::Prepare(op));
        Ok(())
    }

    fn erase(
        &mut self,
        _target: &mut dyn Target,
        region: &FlashGeometry,
        addr: TargetAddr,
        len: u32,
    ) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.flash_log.push(FlashEvent::Erase(addr, len));
        if s.fail_flash_erase {
            return Err(TargetError::NonFatal);
        }
        for a in addr..addr + len {
            s.mem.insert(a, region.erased);
        }
        Ok(())
    }

    fn write(
        &mut self,
        _target: &mut dyn Target,
        _region: &FlashGeometry,
        dest: TargetAddr,
        src: &[u8],
    ) -> TargetResult<()> {
        let mut s = self.0.borrow_mut();
        s.flash_log.push(FlashEvent::Write(dest, src.len() as u32));
        if s.fail_flash_write {
            return Err(TargetError::NonFatal);
        }
        for (i, b) in src.iter().enumerate() {
            s.mem.insert(dest + i as u32, *b);
        }
        Ok(())
    }

    fn done(&mut self, _target: &mut dyn Target, _region: &FlashGeometry) -> TargetResult<()> {
        self.0.borrow_mut().flash_log.push(FlashEvent::Done);
        Ok(())
    }
}

/// A registry holding a single mock chip, plus the handle to its state.
pub fn mock_registry() -> (TargetRegistry, Shared) {
    let state = Shared::default();
    let mut registry = TargetRegistry::new();
    registry.add(mock_descriptor(&state));
    (registry, state)
}

pub fn mock_descriptor(state: &Shared) -> TargetDescriptor {
    let mut desc =
        TargetDescriptor::new("mock", Box::new(MockChip(state.clone()))).with_core("M4");
    desc.add_ram(RAM_START, RAM_LEN);
    desc.add_flash(FlashRegion::new(
        FLASH_START,
        FLASH_LEN,
        FLASH_BLOCK,
        4,
        0xff,
        Box::new(MockFlash(state.clone())),
    ));
    desc
}
