//! Types / traits which are not expected to be directly implemented by
//! `probestub` users.

mod be_bytes;

pub use be_bytes::*;
