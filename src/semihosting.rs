//! Forward semihosting File-I/O to the GDB host.
//!
//! When a program running on the target performs a semihosting call (e.g:
//! `SYS_OPEN` via `bkpt 0xab` on Cortex-M), the driver decodes the call and
//! reports it from [`Target::halt_poll`](crate::target::Target::halt_poll)
//! as a [`HostIoRequest`]. The stub then:
//!
//! 1. sends the matching GDB File-I/O request (`Fopen,...`, `Fread,...`)
//! 2. keeps servicing packets (GDB reads / writes target memory to move the
//!    file data) until the host answers with an `F` packet
//! 3. hands the resulting [`HostIoReply`] to the driver's
//!    [`HostIo`](crate::target::ext::host_io::HostIo) extension
//! 4. resumes the target, unless the user pressed Ctrl-C during the call
//!
//! Pointers in requests are target addresses. Strings are passed as
//! `pointer/length` pairs, where the length includes the NUL terminator.

use core::fmt;

use bitflags::bitflags;

use crate::TargetAddr;

bitflags! {
    /// Host flags for opening files.
    ///
    /// See the GDB documentation on
    /// [Open Flags](https://sourceware.org/gdb/current/onlinedocs/gdb/Open-Flags.html#Open-Flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// A read-only file.
        const O_RDONLY = 0x0;
        /// A write-only file.
        const O_WRONLY = 0x1;
        /// A read-write file.
        const O_RDWR = 0x2;
        /// Append to an existing file.
        const O_APPEND = 0x8;
        /// Create a non-existent file.
        const O_CREAT = 0x200;
        /// Truncate an existing file.
        const O_TRUNC = 0x400;
        /// Exclusive access.
        const O_EXCL = 0x800;
    }
}

/// Reference point for an `lseek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// From the start of the file.
    Start = 0,
    /// From the current position.
    Current = 1,
    /// From the end of the file.
    End = 2,
}

/// A string (or buffer) in target memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStr {
    /// Address of the first byte.
    pub addr: TargetAddr,
    /// Length, including the NUL terminator.
    pub len: u32,
}

/// A File-I/O operation the GDB host must perform on the target's behalf.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostIoRequest {
    Open {
        path: TargetStr,
        flags: OpenFlags,
        mode: u32,
    },
    Close {
        fd: i32,
    },
    Read {
        fd: i32,
        buf: TargetAddr,
        count: u32,
    },
    Write {
        fd: i32,
        buf: TargetAddr,
        count: u32,
    },
    Lseek {
        fd: i32,
        offset: i32,
        whence: SeekFrom,
    },
    Rename {
        old: TargetStr,
        new: TargetStr,
    },
    Unlink {
        path: TargetStr,
    },
    Stat {
        path: TargetStr,
        buf: TargetAddr,
    },
    Fstat {
        fd: i32,
        buf: TargetAddr,
    },
    GetTimeOfDay {
        tv: TargetAddr,
        tz: TargetAddr,
    },
    IsATty {
        fd: i32,
    },
    System {
        cmd: TargetStr,
    },
}

impl fmt::Display for TargetStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}/{:X}", self.addr, self.len)
    }
}

/// Renders the body of the `F` request packet.
impl fmt::Display for HostIoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HostIoRequest::*;

        // negative values are sent as their two's complement bit pattern
        match *self {
            Open { path, flags, mode } => {
                write!(f, "Fopen,{},{:08X},{:08X}", path, flags.bits(), mode)
            }
            Close { fd } => write!(f, "Fclose,{:08X}", fd as u32),
            Read { fd, buf, count } => write!(f, "Fread,{:08X},{:08X},{:08X}", fd as u32, buf, count),
            Write { fd, buf, count } => {
                write!(f, "Fwrite,{:08X},{:08X},{:08X}", fd as u32, buf, count)
            }
            Lseek { fd, offset, whence } => write!(
                f,
                "Flseek,{:08X},{:08X},{:08X}",
                fd as u32, offset as u32, whence as u32
            ),
            Rename { old, new } => write!(f, "Frename,{},{}", old, new),
            Unlink { path } => write!(f, "Funlink,{}", path),
            Stat { path, buf } => write!(f, "Fstat,{},{:08X}", path, buf),
            Fstat { fd, buf } => write!(f, "Ffstat,{:X},{:08X}", fd as u32, buf),
            GetTimeOfDay { tv, tz } => write!(f, "Fgettimeofday,{:08X},{:08X}", tv, tz),
            IsATty { fd } => write!(f, "Fisatty,{:08X}", fd as u32),
            System { cmd } => write!(f, "Fsystem,{}", cmd),
        }
    }
}

/// The GDB host's answer to a [`HostIoRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostIoReply {
    /// Return value of the host call (`-1` on failure).
    pub retcode: i32,
    /// GDB errno value, when `retcode` signals a failure.
    pub errno: u32,
    /// The user pressed Ctrl-C while the host was servicing the call.
    pub interrupted: bool,
}
