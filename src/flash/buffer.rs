use alloc::vec;
use alloc::vec::Vec;

use crate::TargetAddr;

/// A chunk of flash contents, staged in RAM until it is programmed.
///
/// `low..high` tracks the bytes actually written by GDB, so that a partially
/// filled buffer only programs the write units it touches.
#[derive(Debug)]
pub(super) struct WriteBuffer {
    data: Vec<u8>,
    base: Option<TargetAddr>,
    low: TargetAddr,
    high: TargetAddr,
}

impl WriteBuffer {
    pub fn new(size: usize) -> WriteBuffer {
        WriteBuffer {
            data: vec![0; size],
            base: None,
            low: TargetAddr::MAX,
            high: 0,
        }
    }

    pub fn base(&self) -> Option<TargetAddr> {
        self.base
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `(base, low, high)` if there is anything to program.
    pub fn pending(&self) -> Option<(TargetAddr, TargetAddr, TargetAddr)> {
        let base = self.base?;
        if self.low < self.high {
            Some((base, self.low, self.high))
        } else {
            None
        }
    }

    /// Point the buffer at a new chunk of flash, filled with the erased
    /// value.
    pub fn rebase(&mut self, base: TargetAddr, erased: u8) {
        for b in self.data.iter_mut() {
            *b = erased;
        }
        self.base = Some(base);
        self.low = TargetAddr::MAX;
        self.high = 0;
    }

    pub fn fill(&mut self, offset: usize, src: &[u8]) {
        let base = match self.base {
            Some(base) => base,
            None => return,
        };
        self.data[offset..offset + src.len()].copy_from_slice(src);

        let start = base + offset as TargetAddr;
        self.low = self.low.min(start);
        self.high = self.high.max(start + src.len() as TargetAddr);
    }

    /// Forget the staged data, keeping the allocation.
    pub fn emptied(mut self) -> WriteBuffer {
        self.base = None;
        self.low = TargetAddr::MAX;
        self.high = 0;
        self
    }
}
