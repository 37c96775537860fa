//! Common types and definitions used across `probestub`.

mod signal;

pub use self::signal::Signal;
