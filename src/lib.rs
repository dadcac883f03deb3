pub mod error;
pub mod flow;
pub mod logging;
pub mod parser;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use error::{DecodeError, Malformation, ReportError, WalkError};
pub use flow::{Conversation, Direction};
pub use parser::{PacketDescriptor, PacketWalker};
