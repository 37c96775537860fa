//! The flash transaction sequencer.
//!
//! GDB's `load` command programs flash using three packets: `vFlashErase`
//! (one per erase range), `vFlashWrite` (one per chunk of data), and a final
//! `vFlashDone`. Each arrives as a separate packet, so all sequencing state
//! lives in the [`FlashRegion`]s themselves: the operation currently in
//! progress, and a write buffer used to batch small / unaligned writes into
//! whole programming units.
//!
//! Chip-specific programming algorithms are supplied by [`FlashDriver`]
//! implementations, one per region.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::target::{Target, TargetError, TargetResult};
use crate::TargetAddr;

mod buffer;

use buffer::WriteBuffer;

/// Upper bound on the size of a region's write buffer.
pub const MAX_WRITE_BUFFER: usize = 2048;

/// The operation a region is currently prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOperation {
    /// Idle (locked).
    None,
    /// Programming.
    Write,
    /// Erasing individual blocks.
    Erase,
    /// Erasing the whole region in one go.
    MassErase,
}

/// Static geometry of a flash region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// First address of the region.
    pub start: TargetAddr,
    /// Length of the region, in bytes.
    pub length: u32,
    /// Erase granularity.
    pub block_size: u32,
    /// Programming granularity.
    pub write_size: u32,
    /// Value of an erased byte.
    pub erased: u8,
}

impl FlashGeometry {
    /// Whether `addr` lies within the region.
    pub fn contains(&self, addr: TargetAddr) -> bool {
        addr >= self.start && addr - self.start < self.length
    }

    /// Round `addr` down to the start of its enclosing `align`-sized chunk,
    /// counting chunks from the start of the region.
    fn align_down(&self, addr: TargetAddr, align: u32) -> TargetAddr {
        addr - (addr - self.start) % align
    }

    /// One past the last address of the region.
    fn end(&self) -> u64 {
        self.start as u64 + self.length as u64
    }
}

/// Chip-specific flash programming algorithm.
///
/// Every method receives the target the region belongs to, so drivers can
/// poke at the flash controller's registers through
/// [`Target::mem_write`](crate::target::Target::mem_write) and friends.
///
/// Returning an error from any method aborts the current flash command. The
/// sequencer always calls [`done`](FlashDriver::done) on the region before
/// reporting the failure.
pub trait FlashDriver {
    /// Get the region ready for `op` (e.g: unlock the controller, select
    /// the erase or program mode).
    fn prepare(
        &mut self,
        target: &mut dyn Target,
        region: &FlashGeometry,
        op: FlashOperation,
    ) -> TargetResult<()> {
        let _ = (target, region, op);
        Ok(())
    }

    /// Erase `len` bytes at `addr`. The range is always a single, aligned
    /// erase block.
    fn erase(
        &mut self,
        target: &mut dyn Target,
        region: &FlashGeometry,
        addr: TargetAddr,
        len: u32,
    ) -> TargetResult<()>;

    /// Program `src` at `dest`. The range is always a single, aligned write
    /// unit.
    fn write(
        &mut self,
        target: &mut dyn Target,
        region: &FlashGeometry,
        dest: TargetAddr,
        src: &[u8],
    ) -> TargetResult<()>;

    /// Finish the current operation (e.g: wait for completion, re-lock the
    /// controller).
    fn done(&mut self, target: &mut dyn Target, region: &FlashGeometry) -> TargetResult<()> {
        let _ = (target, region);
        Ok(())
    }

    /// Whether the driver can erase the whole region in a single operation.
    fn supports_mass_erase(&self) -> bool {
        false
    }

    /// Erase the whole region.
    fn mass_erase(&mut self, target: &mut dyn Target, region: &FlashGeometry) -> TargetResult<()> {
        let _ = (target, region);
        Err(TargetError::NonFatal)
    }
}

/// A contiguous bank of flash memory, and the state of any operation in
/// progress on it.
pub struct FlashRegion {
    geometry: FlashGeometry,
    operation: FlashOperation,
    buffer_size: u32,
    buffer: Option<WriteBuffer>,
    driver: Box<dyn FlashDriver>,
}

impl core::fmt::Debug for FlashRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlashRegion")
            .field("geometry", &self.geometry)
            .field("operation", &self.operation)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

impl FlashRegion {
    /// Describe a new flash region.
    ///
    /// `write_size` is clamped to `1..=block_size`.
    pub fn new(
        start: TargetAddr,
        length: u32,
        block_size: u32,
        write_size: u32,
        erased: u8,
        driver: Box<dyn FlashDriver>,
    ) -> FlashRegion {
        let block_size = block_size.max(1);
        let write_size = write_size.max(1).min(block_size);

        // largest multiple of the write size which fits under the cap
        let cap = block_size.min(MAX_WRITE_BUFFER as u32);
        let buffer_size = (cap / write_size).max(1) * write_size;

        FlashRegion {
            geometry: FlashGeometry {
                start,
                length,
                block_size,
                write_size,
                erased,
            },
            operation: FlashOperation::None,
            buffer_size,
            buffer: None,
            driver,
        }
    }

    /// The region's geometry.
    pub fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    /// The operation currently in progress.
    pub fn operation(&self) -> FlashOperation {
        self.operation
    }

    /// Size of the write buffer used to batch writes.
    pub fn write_buffer_size(&self) -> u32 {
        self.buffer_size
    }

    fn prepare(&mut self, target: &mut dyn Target, op: FlashOperation) -> TargetResult<()> {
        if self.operation == op {
            return Ok(());
        }

        if self.operation != FlashOperation::None {
            self.done(target)?;
        }

        self.operation = op;
        let res = self.driver.prepare(target, &self.geometry, op);
        if res.is_err() {
            self.operation = FlashOperation::None;
        }
        res
    }

    fn done(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        if self.operation == FlashOperation::None {
            return Ok(());
        }

        let res = self.driver.done(target, &self.geometry);
        self.buffer = None;
        self.operation = FlashOperation::None;
        res
    }

    /// Program whatever is pending in the write buffer.
    fn flush(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        let (base, low, high) = match self.buffer.as_ref().and_then(WriteBuffer::pending) {
            Some(pending) => pending,
            None => return Ok(()),
        };

        // `prepare` drops the buffer if it has to finish another operation
        let buf = match self.buffer.take() {
            Some(buf) => buf,
            None => return Ok(()),
        };
        if let Err(e) = self.prepare(target, FlashOperation::Write) {
            self.buffer = Some(buf.emptied());
            return Err(e);
        }

        let write_size = self.geometry.write_size;
        let end = self.geometry.end();
        let aligned = base + (low - base) / write_size * write_size;
        let mut res = Ok(());
        let mut addr = aligned;
        while addr < high {
            let offset = (addr - base) as usize;
            // the buffer may hang past the end of the region, its last
            // write unit is cut short there
            let len = (end - addr as u64).min(write_size as u64) as usize;
            let chunk = &buf.data()[offset..offset + len];
            res = self.driver.write(target, &self.geometry, addr, chunk);
            if res.is_err() {
                error!("flash write failed at {:#010x}", addr);
                break;
            }
            addr += write_size;
        }

        self.buffer = Some(buf.emptied());
        res
    }

    fn buffered_write(
        &mut self,
        target: &mut dyn Target,
        mut dest: TargetAddr,
        mut src: &[u8],
    ) -> TargetResult<()> {
        while !src.is_empty() {
            let base = self.geometry.align_down(dest, self.buffer_size);

            if self.buffer.as_ref().and_then(WriteBuffer::base) != Some(base) {
                self.flush(target)?;
                let size = self.buffer_size as usize;
                self.buffer
                    .get_or_insert_with(|| WriteBuffer::new(size))
                    .rebase(base, self.geometry.erased);
            }

            let offset = (dest - base) as usize;
            let n = (self.buffer_size as usize - offset).min(src.len());
            if let Some(buf) = &mut self.buffer {
                buf.fill(offset, &src[..n]);
            }

            dest += n as u32;
            src = &src[n..];
        }
        Ok(())
    }
}

/// The flash regions of one target, plus the target-wide "flash mode" flag.
#[derive(Debug, Default)]
pub struct FlashMap {
    regions: Vec<FlashRegion>,
    flash_mode: bool,
}

impl FlashMap {
    /// An empty map, not in flash mode.
    pub fn new() -> FlashMap {
        FlashMap::default()
    }

    /// Register a new region.
    pub fn add_region(&mut self, region: FlashRegion) {
        self.regions.push(region)
    }

    /// All regions, in registration order.
    pub fn regions(&self) -> &[FlashRegion] {
        &self.regions
    }

    /// Whether a flash sequence is in progress.
    pub fn in_flash_mode(&self) -> bool {
        self.flash_mode
    }

    /// Find the region containing `addr`.
    pub fn region_for_addr(&self, addr: TargetAddr) -> Option<&FlashRegion> {
        self.regions.iter().find(|r| r.geometry.contains(addr))
    }

    fn index_for_addr(&self, addr: TargetAddr) -> Option<usize> {
        self.regions.iter().position(|r| r.geometry.contains(addr))
    }

    fn enter_flash_mode(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        if self.flash_mode {
            return Ok(());
        }
        info!("entering flash mode");
        target.enter_flash_mode()?;
        self.flash_mode = true;
        Ok(())
    }

    fn exit_flash_mode(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        if !self.flash_mode {
            return Ok(());
        }
        info!("leaving flash mode");
        self.flash_mode = false;
        target.exit_flash_mode()
    }

    /// Erase every block overlapping `addr..addr + len`.
    ///
    /// The request may span several regions. If it covers a whole region and
    /// the region's driver supports it, the region is mass-erased instead.
    pub fn erase(
        &mut self,
        target: &mut dyn Target,
        mut addr: TargetAddr,
        len: u32,
    ) -> TargetResult<()> {
        self.enter_flash_mode(target)?;

        let mut active = self.index_for_addr(addr).ok_or(TargetError::NonFatal)?;
        let mut len = len as u64;
        let mut res = Ok(());

        while len > 0 {
            let idx = match self.index_for_addr(addr) {
                Some(idx) => idx,
                None => {
                    error!("erase outside of flash at {:#010x}", addr);
                    res = Err(TargetError::NonFatal);
                    break;
                }
            };

            if idx != active {
                self.regions[active].done(target)?;
                active = idx;
            }

            let region = &mut self.regions[idx];
            let geom = region.geometry;
            let block_start = geom.align_down(addr, geom.block_size);
            let mass = region.driver.supports_mass_erase()
                && block_start == geom.start
                && addr as u64 + len >= geom.end();
            let block_end = if mass {
                geom.end()
            } else {
                block_start as u64 + geom.block_size as u64
            };

            let op = if mass {
                FlashOperation::MassErase
            } else {
                FlashOperation::Erase
            };
            region.prepare(target, op)?;

            debug!("erase {:#010x}+{:#x}", block_start, block_end - block_start as u64);
            res = if mass {
                region.driver.mass_erase(target, &geom)
            } else {
                region.driver.erase(target, &geom, block_start, geom.block_size)
            };
            if res.is_err() {
                error!("flash erase failed at {:#010x}", block_start);
                break;
            }

            len -= (block_end - addr as u64).min(len);
            if len > 0 {
                addr = block_end as TargetAddr;
            }
        }

        res.and(self.regions[active].done(target))
    }

    /// Buffer `src` for programming at `dest`.
    ///
    /// Data is programmed as soon as it leaves the write buffer (i.e: when a
    /// write lands in a different buffer-sized chunk, or on
    /// [`complete`](FlashMap::complete)).
    pub fn write(
        &mut self,
        target: &mut dyn Target,
        mut dest: TargetAddr,
        mut src: &[u8],
    ) -> TargetResult<()> {
        self.enter_flash_mode(target)?;

        let mut active = None;
        let mut res = Ok(());
        for (idx, region) in self.regions.iter_mut().enumerate() {
            if region.geometry.contains(dest) {
                active = Some(idx);
            } else if region.buffer.is_some() {
                let flushed = region.flush(target);
                res = res.and(flushed).and(region.done(target));
            }
        }
        let mut active = active.ok_or(TargetError::NonFatal)?;
        res?;

        while !src.is_empty() {
            let idx = self.index_for_addr(dest).ok_or(TargetError::NonFatal)?;

            if idx != active {
                let prev = &mut self.regions[active];
                let flushed = prev.flush(target);
                flushed.and(prev.done(target))?;
                active = idx;
            }

            let region = &mut self.regions[idx];
            let room = (region.geometry.length - (dest - region.geometry.start)) as usize;
            let n = room.min(src.len());

            if let Err(e) = region.buffered_write(target, dest, &src[..n]) {
                error!("flash write failed at {:#010x}", dest);
                let _ = region.done(target);
                return Err(e);
            }

            dest = dest.wrapping_add(n as u32);
            src = &src[n..];
        }
        Ok(())
    }

    /// Program all buffered data, finish every region, and leave flash mode.
    ///
    /// Fails if no flash sequence is in progress.
    pub fn complete(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        if !self.flash_mode {
            return Err(TargetError::NonFatal);
        }

        let mut res = Ok(());
        for region in self.regions.iter_mut() {
            let flushed = region.flush(target);
            res = res.and(flushed).and(region.done(target));
        }

        res.and(self.exit_flash_mode(target))
    }

    /// Erase every region.
    ///
    /// Regions whose driver can't mass-erase are erased block by block.
    pub fn mass_erase(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        self.enter_flash_mode(target)?;

        let mut res = Ok(());
        for region in self.regions.iter_mut() {
            res = region.mass_erase(target);
            if res.is_err() {
                error!("mass erase failed for flash at {:#010x}", region.geometry.start);
                break;
            }
        }

        res.and(self.exit_flash_mode(target))
    }
}

impl FlashRegion {
    fn mass_erase(&mut self, target: &mut dyn Target) -> TargetResult<()> {
        let geom = self.geometry;
        let mass = self.driver.supports_mass_erase();
        if !mass {
            warn!("no mass erase for flash at {:#010x}, erasing by block", geom.start);
        }

        let op = if mass {
            FlashOperation::MassErase
        } else {
            FlashOperation::Erase
        };
        self.prepare(target, op)?;

        let res = if mass {
            self.driver.mass_erase(target, &geom)
        } else {
            let mut res = Ok(());
            let mut addr = geom.start as u64;
            while addr < geom.end() {
                res = self
                    .driver
                    .erase(target, &geom, addr as TargetAddr, geom.block_size);
                if res.is_err() {
                    break;
                }
                addr += geom.block_size as u64;
            }
            res
        };

        res.and(self.done(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::rc::Rc;
    use core::cell::RefCell;

    use crate::target::mock::NullTarget;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Prepare(FlashOperation),
        Erase(u32, u32),
        MassErase,
        Write(u32, Vec<u8>),
        Done,
    }

    struct Recorder {
        log: Rc<RefCell<Vec<Event>>>,
        mass: bool,
        fail_erase_at: Option<u32>,
        fail_write_at: Option<u32>,
    }

    impl FlashDriver for Recorder {
        fn prepare(
            &mut self,
            _: &mut dyn Target,
            _: &FlashGeometry,
            op: FlashOperation,
        ) -> TargetResult<()> {
            self.log.borrow_mut().push(Event::Prepare(op));
            Ok(())
        }

        fn erase(
            &mut self,
            _: &mut dyn Target,
            _: &FlashGeometry,
            addr: TargetAddr,
            len: u32,
        ) -> TargetResult<()> {
            self.log.borrow_mut().push(Event::Erase(addr, len));
            if self.fail_erase_at == Some(addr) {
                return Err(TargetError::NonFatal);
            }
            Ok(())
        }

        fn write(
            &mut self,
            _: &mut dyn Target,
            _: &FlashGeometry,
            dest: TargetAddr,
            src: &[u8],
        ) -> TargetResult<()> {
            self.log.borrow_mut().push(Event::Write(dest, src.to_vec()));
            if self.fail_write_at == Some(dest) {
                return Err(TargetError::NonFatal);
            }
            Ok(())
        }

        fn done(&mut self, _: &mut dyn Target, _: &FlashGeometry) -> TargetResult<()> {
            self.log.borrow_mut().push(Event::Done);
            Ok(())
        }

        fn supports_mass_erase(&self) -> bool {
            self.mass
        }

        fn mass_erase(&mut self, _: &mut dyn Target, _: &FlashGeometry) -> TargetResult<()> {
            self.log.borrow_mut().push(Event::MassErase);
            Ok(())
        }
    }

    fn region(
        start: u32,
        length: u32,
        block_size: u32,
        write_size: u32,
        log: &Rc<RefCell<Vec<Event>>>,
    ) -> FlashRegion {
        FlashRegion::new(
            start,
            length,
            block_size,
            write_size,
            0xff,
            Box::new(Recorder {
                log: log.clone(),
                mass: false,
                fail_erase_at: None,
                fail_write_at: None,
            }),
        )
    }

    #[test]
    fn buffer_size() {
        let log = Rc::new(RefCell::new(Vec::new()));
        assert_eq!(region(0, 0x10000, 0x400, 4, &log).write_buffer_size(), 0x400);
        assert_eq!(region(0, 0x20000, 0x4000, 8, &log).write_buffer_size(), 2048);
        assert_eq!(region(0, 0x10000, 0x400, 0x180, &log).write_buffer_size(), 0x300);
        assert_eq!(region(0, 0x10000, 0x800, 0x1000, &log).write_buffer_size(), 0x800);
    }

    #[test]
    fn erase_is_block_aligned() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(region(0x0800_0000, 0x1000, 0x400, 4, &log));

        flash.erase(&mut target, 0x0800_0010, 0x400).unwrap();

        assert!(flash.in_flash_mode());
        assert_eq!(target.resets, 1);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Erase),
                Event::Erase(0x0800_0000, 0x400),
                Event::Erase(0x0800_0400, 0x400),
                Event::Done,
            ]
        );
    }

    #[test]
    fn erase_whole_region_uses_mass_erase() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(FlashRegion::new(
            0x0800_0000,
            0x1000,
            0x400,
            4,
            0xff,
            Box::new(Recorder {
                log: log.clone(),
                mass: true,
                fail_erase_at: None,
                fail_write_at: None,
            }),
        ));

        flash.erase(&mut target, 0x0800_0000, 0x1000).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::MassErase),
                Event::MassErase,
                Event::Done,
            ]
        );
    }

    #[test]
    fn erase_across_regions_finishes_the_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(region(0x0800_0000, 0x400, 0x400, 4, &log));
        flash.add_region(region(0x0800_0400, 0x800, 0x800, 4, &log));

        flash.erase(&mut target, 0x0800_0000, 0xc00).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Erase),
                Event::Erase(0x0800_0000, 0x400),
                Event::Done,
                Event::Prepare(FlashOperation::Erase),
                Event::Erase(0x0800_0400, 0x800),
                Event::Done,
            ]
        );
    }

    #[test]
    fn failed_erase_still_finishes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(FlashRegion::new(
            0x0800_0000,
            0x1000,
            0x400,
            4,
            0xff,
            Box::new(Recorder {
                log: log.clone(),
                mass: false,
                fail_erase_at: Some(0x0800_0400),
                fail_write_at: None,
            }),
        ));

        let res = flash.erase(&mut target, 0x0800_0000, 0x1000);

        assert_eq!(res, Err(TargetError::NonFatal));
        assert_eq!(log.borrow().last(), Some(&Event::Done));
        assert!(!log.borrow().contains(&Event::Erase(0x0800_0800, 0x400)));
    }

    #[test]
    fn writes_are_buffered_and_padded() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(region(0x0800_0000, 0x1000, 0x400, 4, &log));

        flash.write(&mut target, 0x0800_0002, &[1, 2, 3]).unwrap();
        flash.write(&mut target, 0x0800_0005, &[4]).unwrap();
        assert!(log.borrow().is_empty());

        flash.complete(&mut target).unwrap();

        assert!(!flash.in_flash_mode());
        assert_eq!(target.resets, 2);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Write),
                Event::Write(0x0800_0000, vec![0xff, 0xff, 1, 2]),
                Event::Write(0x0800_0004, vec![3, 4, 0xff, 0xff]),
                Event::Done,
            ]
        );
    }

    #[test]
    fn write_flushes_on_buffer_change() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(region(0x0800_0000, 0x1000, 0x400, 4, &log));

        flash.write(&mut target, 0x0800_03fc, &[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Write),
                Event::Write(0x0800_03fc, vec![1, 2, 3, 4]),
            ]
        );
    }

    #[test]
    fn failed_write_still_finishes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(FlashRegion::new(
            0x0800_0000,
            0x1000,
            0x400,
            4,
            0xff,
            Box::new(Recorder {
                log: log.clone(),
                mass: false,
                fail_erase_at: None,
                fail_write_at: Some(0x0800_0000),
            }),
        ));

        flash.write(&mut target, 0x0800_0000, &[0; 4]).unwrap();
        let res = flash.write(&mut target, 0x0800_0400, &[0; 4]);

        assert_eq!(res, Err(TargetError::NonFatal));
        assert_eq!(log.borrow().last(), Some(&Event::Done));
        assert_eq!(flash.regions()[0].operation(), FlashOperation::None);
    }

    #[test]
    fn write_stops_at_region_end() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        // 0x406 bytes: the second buffer only holds 6 bytes of the region
        flash.add_region(region(0x0800_0000, 0x406, 0x400, 4, &log));

        flash.write(&mut target, 0x0800_0400, &[0xaa; 6]).unwrap();
        flash.complete(&mut target).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Write),
                Event::Write(0x0800_0400, vec![0xaa; 4]),
                Event::Write(0x0800_0404, vec![0xaa; 2]),
                Event::Done,
            ]
        );
    }

    #[test]
    fn complete_outside_flash_mode_fails() {
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        assert_eq!(flash.complete(&mut target), Err(TargetError::NonFatal));
    }

    #[test]
    fn mass_erase_by_block() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut target = NullTarget::default();
        let mut flash = FlashMap::new();
        flash.add_region(region(0x0800_0000, 0x800, 0x400, 4, &log));

        flash.mass_erase(&mut target).unwrap();

        assert!(!flash.in_flash_mode());
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Prepare(FlashOperation::Erase),
                Event::Erase(0x0800_0000, 0x400),
                Event::Erase(0x0800_0400, 0x400),
                Event::Done,
            ]
        );
    }
}
