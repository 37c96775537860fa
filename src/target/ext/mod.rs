//! Optional extensions to [`Target`](super::Target).
//!
//! Not every chip driver can do everything. Rather than forcing each driver
//! to stub out dozens of methods, optional capabilities are grouped into
//! small "Inlineable Dyn Extension Traits" (IDETs). A driver opts into an
//! extension by implementing the extension trait, and overriding the
//! corresponding `support_` method on `Target` to return `Some(self)`:
//!
//! ```rust,ignore
//! impl Target for MyChip {
//!     fn support_monitor_cmd(&mut self) -> Option<MonitorCmdOps<'_>> {
//!         Some(self)
//!     }
//! }
//! ```
//!
//! If `MyChip` doesn't actually implement `MonitorCmd`, the `Some(self)`
//! cast fails to compile, so a driver can never advertise a capability it
//! doesn't have.
//!
//! The stub can then _query_ whether a capability is present without
//! invoking anything on the chip:
//!
//! ```rust,ignore
//! match target.support_monitor_cmd() {
//!     Some(ops) => ops.handle_monitor_cmd(cmd, out)?,
//!     None => { /* empty reply */ }
//! }
//! ```
//!
//! Since drivers are held as `Box<dyn Target>` by the
//! [`TargetRegistry`](crate::registry::TargetRegistry), extension traits
//! carry no associated types, and do not require `Target` as a supertrait.

macro_rules! doc_comment {
    ($x:expr, $($tt:tt)*) => {
        #[doc = $x]
        $($tt)*
    };
}

macro_rules! define_ext {
    ($extname:ident, $exttrait:ident) => {
        doc_comment! {
            concat!("See [`", stringify!($exttrait), "`](trait.", stringify!($exttrait), ".html)."),
            pub type $extname<'a> = &'a mut dyn $exttrait;
        }
    };
}

pub mod breakwatch;
pub mod host_io;
pub mod monitor_cmd;
pub mod single_register_access;
