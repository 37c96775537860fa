//! Private utility types used internally within `probestub`.

pub mod managed_vec;
