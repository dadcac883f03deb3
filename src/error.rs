use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated header: needed {needed} bytes, {available} available")]
    TruncatedHeader { needed: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformation {
    #[error("IHL {0} is below the minimum of 5")]
    IhlTooSmall(u8),
    #[error("TCP data offset {0} is below the minimum of 5")]
    DataOffsetTooSmall(u8),
    #[error("total length {total_length} is shorter than the {header_length} header bytes")]
    NegativePayload { total_length: u16, header_length: usize },
    #[error("log ends inside the packet: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
}

impl From<DecodeError> for Malformation {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::TruncatedHeader { needed, available } => {
                Malformation::Truncated { needed, available }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("malformed header in packet {index}: {reason}")]
    Malformed { index: usize, reason: Malformation },
    #[error("failed to read packet log")]
    Io(#[from] io::Error),
}

impl WalkError {
    pub fn packet_index(&self) -> Option<usize> {
        match self {
            WalkError::Malformed { index, .. } => Some(*index),
            WalkError::Io(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("failed to write output")]
    Output(#[source] io::Error),
}
