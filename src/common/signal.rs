use core::fmt;

/// Signal numbers reported to the GDB client in stop replies.
///
/// Only the handful of signals a bare-metal debug probe ever reports are
/// defined here. The numbering follows GDB's target-independent signal table.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u8);

#[allow(clippy::upper_case_acronyms)]
#[rustfmt::skip]
impl Signal {
    #[doc = "Interrupt (user requested halt)"] pub const SIGINT:  Self = Self(2);
    #[doc = "Trace/breakpoint trap"]           pub const SIGTRAP: Self = Self(5);
    #[doc = "Segmentation fault"]              pub const SIGSEGV: Self = Self(11);
    #[doc = "Resource lost (target lost)"]     pub const SIGLOST: Self = Self(29);
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Signal::SIGINT => write!(f, "SIGINT"),
            Signal::SIGTRAP => write!(f, "SIGTRAP"),
            Signal::SIGSEGV => write!(f, "SIGSEGV"),
            Signal::SIGLOST => write!(f, "SIGLOST"),
            Signal(n) => write!(f, "signal {}", n),
        }
    }
}
