use super::decoder::{
    FIXED_HEADER_LEN, IpHeader, TcpHeader, decode_ip_header, decode_tcp_header, format_ipv4,
};
use crate::error::{Malformation, WalkError};
use crate::flow::{Conversation, Direction};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::iter::FusedIterator;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

const MIN_HEADER_WORDS: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketDescriptor {
    pub index: usize,
    pub ip: IpHeader,
    pub tcp: TcpHeader,
    pub direction: Direction,
    pub payload_start: u64,
    pub payload_end: u64,
    pub payload: Vec<u8>,
}

impl PacketDescriptor {
    pub fn payload_range(&self) -> Range<u64> {
        self.payload_start..self.payload_end
    }

    pub fn header_len(&self) -> usize {
        self.ip.header_len() + self.tcp.header_len()
    }
}

/// Walks a back-to-back sequence of IPv4/TCP packets.
///
/// Fewer than 20 bytes left at a packet boundary ends the walk cleanly. Any
/// structural violation ends it with [`WalkError::Malformed`]; after that, and
/// after the end of the log, the walker yields nothing more.
pub struct PacketWalker<R> {
    source: R,
    offset: u64,
    index: usize,
    conversation: Option<Conversation>,
    finished: bool,
}

impl PacketWalker<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> PacketWalker<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            offset: 0,
            index: 0,
            conversation: None,
            finished: false,
        }
    }

    /// Latched from packet 0; `None` until that packet's IP header has been read.
    pub fn conversation(&self) -> Option<Conversation> {
        self.conversation
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn packets_read(&self) -> usize {
        self.index
    }

    pub fn next_packet(&mut self) -> Result<Option<PacketDescriptor>, WalkError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.walk_one();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn walk_one(&mut self) -> Result<Option<PacketDescriptor>, WalkError> {
        let index = self.index;
        let packet_start = self.offset;
        let mut fixed = [0u8; FIXED_HEADER_LEN];

        let got = self.fill(&mut fixed)?;
        if got < FIXED_HEADER_LEN {
            debug!(
                packets = index,
                trailing_bytes = got,
                "Reached end of packet log"
            );
            return Ok(None);
        }

        let ip = decode_ip_header(&fixed).map_err(|e| malformed(index, e.into()))?;
        if ip.ihl() < MIN_HEADER_WORDS {
            return Err(malformed(index, Malformation::IhlTooSmall(ip.ihl())));
        }
        self.skip(index, ip.header_len() - FIXED_HEADER_LEN)?;

        let conversation = match self.conversation {
            Some(conversation) => conversation,
            None => {
                let conversation = Conversation::from_first_packet(&ip);
                info!(
                    server = %format_ipv4(conversation.server_address),
                    client = %format_ipv4(conversation.client_address),
                    "Established conversation from first packet"
                );
                self.conversation = Some(conversation);
                conversation
            }
        };

        self.read_within_packet(index, &mut fixed)?;
        let tcp = decode_tcp_header(&fixed).map_err(|e| malformed(index, e.into()))?;
        if tcp.data_offset() < MIN_HEADER_WORDS {
            return Err(malformed(
                index,
                Malformation::DataOffsetTooSmall(tcp.data_offset()),
            ));
        }

        let header_length = ip.header_len() + tcp.header_len();
        let payload_len = usize::from(ip.total_length)
            .checked_sub(header_length)
            .ok_or_else(|| {
                malformed(
                    index,
                    Malformation::NegativePayload {
                        total_length: ip.total_length,
                        header_length,
                    },
                )
            })?;

        let direction = conversation.classify(ip.source_address, ip.destination_address);
        if direction == Direction::Unrelated {
            warn!(
                index,
                src = %ip.source(),
                dst = %ip.destination(),
                "Packet does not belong to the conversation"
            );
        }

        self.skip(index, tcp.header_len() - FIXED_HEADER_LEN)?;

        let payload_start = self.offset;
        let mut payload = vec![0u8; payload_len];
        self.read_within_packet(index, &mut payload)?;

        debug!(
            index,
            offset = packet_start,
            total_length = ip.total_length,
            ihl = ip.ihl(),
            data_offset = tcp.data_offset(),
            payload_len,
            %direction,
            "Decoded packet"
        );

        self.index += 1;
        Ok(Some(PacketDescriptor {
            index,
            ip,
            tcp,
            direction,
            payload_start,
            payload_end: self.offset,
            payload,
        }))
    }

    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    fn read_within_packet(&mut self, index: usize, buf: &mut [u8]) -> Result<(), WalkError> {
        let got = self.fill(buf)?;
        if got < buf.len() {
            return Err(malformed(
                index,
                Malformation::Truncated {
                    needed: buf.len(),
                    available: got,
                },
            ));
        }
        Ok(())
    }

    fn skip(&mut self, index: usize, count: usize) -> Result<(), WalkError> {
        if count == 0 {
            return Ok(());
        }
        let skipped = io::copy(&mut (&mut self.source).take(count as u64), &mut io::sink())?;
        self.offset += skipped;
        if skipped < count as u64 {
            return Err(malformed(
                index,
                Malformation::Truncated {
                    needed: count,
                    available: skipped as usize,
                },
            ));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for PacketWalker<R> {
    type Item = Result<PacketDescriptor, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

impl<R: Read> FusedIterator for PacketWalker<R> {}

fn malformed(index: usize, reason: Malformation) -> WalkError {
    WalkError::Malformed { index, reason }
}
