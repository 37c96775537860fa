mod common;
mod console_output;
mod packet;
mod recv_packet;
mod response_writer;

pub(crate) mod commands;

pub(crate) use common::qxfer;
pub(crate) use packet::{Packet, PacketParseError};
pub(crate) use recv_packet::{RecvPacketBlocking, RecvPacketError};
pub(crate) use response_writer::{Error as ResponseWriterError, ResponseWriter};

pub use console_output::ConsoleOutput;
