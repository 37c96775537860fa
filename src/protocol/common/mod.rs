pub mod hex;
pub mod qxfer;
