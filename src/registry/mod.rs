//! Discovered targets, and their attach / detach lifecycle.
//!
//! Targets are registered at probe time (e.g: after a SWD scan) as
//! [`TargetDescriptor`]s, and addressed by GDB using their 1-based position
//! in the [`TargetRegistry`] (`vAttach;1`, `attach 1`).
//!
//! All lifecycle changes go through the registry so that the [`Session`]'s
//! view of the "current" and "last" targets stays consistent: destroying the
//! current target always demotes the session to "no target", and queues a
//! notification for GDB.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use crate::breakwatch::{BreakwatchKind, BreakwatchManager, BreakwatchStatus};
use crate::flash::{FlashMap, FlashRegion};
use crate::session::Session;
use crate::target::{Target, TargetError, TargetResult};
use crate::TargetAddr;

mod memory_map;

bitflags! {
    /// Behavioral quirks of a target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TargetOptions: u32 {
        /// The driver must not drive the nRST line (e.g: it also resets the
        /// debug port).
        const INHIBIT_NRST = 1 << 0;
        /// Memory can be accessed while the core is running.
        const NONHALTING_MEM = 1 << 1;
        /// The target's debug access is restricted by a read-out protection
        /// mechanism.
        const DEBUG_PROTECTED = 1 << 2;
    }
}

/// Opaque handle to a registered target.
///
/// Handles are never reused, so a stale handle can't accidentally refer to a
/// newer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> TargetId {
        TargetId(raw)
    }
}

/// A region of RAM, reported in the memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamRegion {
    /// First address of the region.
    pub start: TargetAddr,
    /// Length of the region, in bytes.
    pub length: u32,
}

/// One discovered chip.
pub struct TargetDescriptor {
    id: TargetId,
    driver: &'static str,
    core: Option<&'static str>,
    options: TargetOptions,
    target: Box<dyn Target>,
    ram: Vec<RamRegion>,
    flash: FlashMap,
    breakwatch: BreakwatchManager,
    attached: bool,
    cmdline: String,
}

impl fmt::Debug for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDescriptor")
            .field("id", &self.id)
            .field("driver", &self.driver)
            .field("core", &self.core)
            .field("options", &self.options)
            .field("attached", &self.attached)
            .finish()
    }
}

/// `<driver> <core>`, as shown in target listings.
impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.driver)?;
        if let Some(core) = self.core {
            write!(f, " {}", core)?;
        }
        if self.options.contains(TargetOptions::DEBUG_PROTECTED) {
            write!(f, " (protected)")?;
        }
        Ok(())
    }
}

impl TargetDescriptor {
    /// Describe a new target, driven by `target`.
    pub fn new(driver: &'static str, target: Box<dyn Target>) -> TargetDescriptor {
        TargetDescriptor {
            // assigned by `TargetRegistry::add`
            id: TargetId(0),
            driver,
            core: None,
            options: TargetOptions::empty(),
            target,
            ram: Vec::new(),
            flash: FlashMap::new(),
            breakwatch: BreakwatchManager::new(),
            attached: false,
            cmdline: String::new(),
        }
    }

    /// Set the core name (e.g: `"M4"`).
    pub fn with_core(mut self, core: &'static str) -> TargetDescriptor {
        self.core = Some(core);
        self
    }

    /// Set behavioral options.
    pub fn with_options(mut self, options: TargetOptions) -> TargetDescriptor {
        self.options = options;
        self
    }

    /// Add a RAM region to the memory map.
    pub fn add_ram(&mut self, start: TargetAddr, length: u32) {
        self.ram.push(RamRegion { start, length })
    }

    /// Add a flash region to the memory map.
    pub fn add_flash(&mut self, region: FlashRegion) {
        self.flash.add_region(region)
    }

    /// This target's handle.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Name of the driver (chip family) handling this target.
    pub fn driver(&self) -> &'static str {
        self.driver
    }

    /// Name of the core, if known.
    pub fn core(&self) -> Option<&'static str> {
        self.core
    }

    /// Behavioral options.
    pub fn options(&self) -> TargetOptions {
        self.options
    }

    /// Whether GDB is currently attached.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// The command line last passed by `vRun`.
    pub fn cmdline(&self) -> &str {
        &self.cmdline
    }

    /// RAM regions.
    pub fn ram(&self) -> &[RamRegion] {
        &self.ram
    }

    /// Flash regions, and flash sequencing state.
    pub fn flash(&self) -> &FlashMap {
        &self.flash
    }

    /// Live breakpoints / watchpoints.
    pub fn breakwatch(&self) -> &BreakwatchManager {
        &self.breakwatch
    }

    /// The chip driver.
    pub fn target(&mut self) -> &mut dyn Target {
        &mut *self.target
    }

    /// Read target memory, checking for a latched access failure.
    pub fn mem_read(&mut self, dest: &mut [u8], src: TargetAddr) -> TargetResult<()> {
        self.target.mem_read(dest, src);
        if self.target.check_error() {
            debug!("memory read failed at {:#010x}", src);
            return Err(TargetError::NonFatal);
        }
        Ok(())
    }

    /// Write target memory, checking for a latched access failure.
    pub fn mem_write(&mut self, dest: TargetAddr, src: &[u8]) -> TargetResult<()> {
        self.target.mem_write(dest, src);
        if self.target.check_error() {
            debug!("memory write failed at {:#010x}", dest);
            return Err(TargetError::NonFatal);
        }
        Ok(())
    }

    /// Record the `vRun` command line, and hand it to the driver.
    pub fn set_cmdline(&mut self, cmdline: &str) {
        self.cmdline.clear();
        self.cmdline.push_str(cmdline);
        self.target.set_cmdline(cmdline);
    }

    /// Set a breakpoint / watchpoint.
    pub fn breakwatch_set(
        &mut self,
        kind: BreakwatchKind,
        addr: TargetAddr,
        size: usize,
    ) -> TargetResult<BreakwatchStatus> {
        self.breakwatch.set(&mut *self.target, kind, addr, size)
    }

    /// Clear a breakpoint / watchpoint.
    pub fn breakwatch_clear(
        &mut self,
        kind: BreakwatchKind,
        addr: TargetAddr,
        size: usize,
    ) -> TargetResult<BreakwatchStatus> {
        self.breakwatch.clear(&mut *self.target, kind, addr, size)
    }

    /// See [`FlashMap::erase`].
    pub fn flash_erase(&mut self, addr: TargetAddr, len: u32) -> TargetResult<()> {
        self.flash.erase(&mut *self.target, addr, len)
    }

    /// See [`FlashMap::write`].
    pub fn flash_write(&mut self, dest: TargetAddr, src: &[u8]) -> TargetResult<()> {
        self.flash.write(&mut *self.target, dest, src)
    }

    /// See [`FlashMap::complete`].
    pub fn flash_complete(&mut self) -> TargetResult<()> {
        self.flash.complete(&mut *self.target)
    }

    /// See [`FlashMap::mass_erase`].
    pub fn flash_mass_erase(&mut self) -> TargetResult<()> {
        self.flash.mass_erase(&mut *self.target)
    }

    /// The GDB memory map of this target.
    pub fn memory_map(&self) -> String {
        memory_map::memory_map_xml(&self.ram, self.flash.regions())
    }

    /// The GDB target description of this target.
    pub fn target_xml(&self) -> String {
        self.target.description().to_xml()
    }

    fn attach(&mut self) -> TargetResult<()> {
        self.target.attach()?;
        if let Err(e) = self.breakwatch.reset(&mut *self.target) {
            let _ = self.target.detach();
            return Err(e);
        }
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) {
        if let Err(e) = self.breakwatch.reset(&mut *self.target) {
            warn!("{}: failed to clear breakpoints on detach: {:?}", self, e);
        }
        if let Err(e) = self.target.detach() {
            warn!("{}: detach hook failed: {:?}", self, e);
        }
        self.attached = false;
    }
}

/// Every target found on the debug port.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<TargetDescriptor>,
    next_id: u32,
}

impl TargetRegistry {
    /// An empty registry.
    pub fn new() -> TargetRegistry {
        TargetRegistry::default()
    }

    /// Register a newly discovered target.
    pub fn add(&mut self, mut desc: TargetDescriptor) -> TargetId {
        self.next_id += 1;
        desc.id = TargetId(self.next_id);
        debug!("registered target {}: {}", self.targets.len() + 1, desc);
        self.targets.push(desc);
        TargetId(self.next_id)
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// `true` if no targets are registered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterate over `(index, target)` pairs, using the same 1-based indices
    /// accepted by [`attach_n`](TargetRegistry::attach_n).
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TargetDescriptor)> {
        self.targets.iter().enumerate().map(|(i, t)| (i + 1, t))
    }

    /// Look up a target by handle.
    pub fn get(&self, id: TargetId) -> Option<&TargetDescriptor> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Look up a target by handle.
    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetDescriptor> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// The session's current target.
    pub fn current(&mut self, session: &Session) -> Option<&mut TargetDescriptor> {
        let id = session.current()?;
        self.get_mut(id)
    }

    /// Attach to the `n`th target (1-based).
    ///
    /// Returns `false` if there is no such target, or if attaching failed.
    pub fn attach_n(&mut self, n: usize, session: &mut Session) -> bool {
        let id = match n.checked_sub(1).and_then(|i| self.targets.get(i)) {
            Some(t) => t.id,
            None => {
                debug!("no target #{}", n);
                return false;
            }
        };
        self.attach(id, session)
    }

    /// Attach to a target, detaching from the current one first.
    ///
    /// Any failure (including fatal driver errors) leaves the session with no
    /// current target, and returns `false`.
    pub fn attach(&mut self, id: TargetId, session: &mut Session) -> bool {
        if session.current().is_some() {
            self.detach(session);
        }

        let desc = match self.get_mut(id) {
            Some(desc) => desc,
            None => return false,
        };

        match desc.attach() {
            Ok(()) => {
                info!("attached to {}", desc);
                session.set_attached(id);
                true
            }
            Err(e) => {
                warn!("failed to attach to {}: {:?}", desc, e);
                false
            }
        }
    }

    /// Detach from the current target, if any.
    ///
    /// Never fails: driver errors are logged, and the session always ends up
    /// with no current target.
    pub fn detach(&mut self, session: &mut Session) {
        if let Some(desc) = self.current(session) {
            desc.detach();
            info!("detached from {}", desc);
        }
        session.set_detached();
    }

    /// Remove (destroy) a single target.
    pub fn remove(&mut self, id: TargetId, session: &mut Session) -> Option<TargetDescriptor> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        session.on_target_destroyed(id);
        Some(self.targets.remove(idx))
    }

    /// Destroy every target (e.g: before a new scan, or after a fatal error).
    pub fn destroy_all(&mut self, session: &mut Session) {
        for desc in self.targets.drain(..) {
            debug!("destroying {}", desc);
            session.on_target_destroyed(desc.id);
        }
    }
}
