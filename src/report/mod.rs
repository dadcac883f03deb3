use crate::error::{ReportError, WalkError};
use crate::flow::{Conversation, Direction};
use crate::parser::decoder::format_ipv4;
use crate::parser::reader::{PacketDescriptor, PacketWalker};
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, info};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub server_address: u32,
    pub client_address: u32,
    pub first_ihl: u8,
    pub first_total_length: u16,
    pub first_data_offset: u8,
    pub packet_count: usize,
    pub server_to_client: usize,
    pub client_to_server: usize,
    pub unrelated: usize,
    pub server_payload_bytes: u64,
}

impl Summary {
    fn from_first(packet: &PacketDescriptor, conversation: Conversation) -> Self {
        Self {
            server_address: conversation.server_address,
            client_address: conversation.client_address,
            first_ihl: packet.ip.ihl(),
            first_total_length: packet.ip.total_length,
            first_data_offset: packet.tcp.data_offset(),
            packet_count: 0,
            server_to_client: 0,
            client_to_server: 0,
            unrelated: 0,
            server_payload_bytes: 0,
        }
    }

    fn record(&mut self, packet: &PacketDescriptor) {
        self.packet_count += 1;
        match packet.direction {
            Direction::ServerToClient => {
                self.server_to_client += 1;
                self.server_payload_bytes += packet.payload.len() as u64;
            }
            Direction::ClientToServer => self.client_to_server += 1,
            Direction::Unrelated => self.unrelated += 1,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            format_ipv4(self.server_address),
            format_ipv4(self.client_address),
            self.first_ihl,
            self.first_total_length,
            self.first_data_offset,
            self.packet_count
        )
    }
}

pub fn summarize<R: Read>(mut walker: PacketWalker<R>) -> Result<Option<Summary>, WalkError> {
    let mut summary: Option<Summary> = None;

    while let Some(packet) = walker.next_packet()? {
        if summary.is_none()
            && let Some(conversation) = walker.conversation()
        {
            summary = Some(Summary::from_first(&packet, conversation));
        }
        if let Some(summary) = summary.as_mut() {
            summary.record(&packet);
        }
    }

    if let Some(summary) = &summary {
        info!(
            packets = summary.packet_count,
            server_to_client = summary.server_to_client,
            client_to_server = summary.client_to_server,
            unrelated = summary.unrelated,
            "Summarized packet log"
        );
    }
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub packets: usize,
    pub payload_packets: usize,
    pub bytes_written: u64,
}

/// Writes every non-empty server-to-client payload to `sink`, in log order.
///
/// The sink is flushed even when the walk fails, so payload from the packets
/// before a malformed one is kept.
pub fn extract_payload<R: Read, W: Write>(
    mut walker: PacketWalker<R>,
    sink: &mut W,
) -> Result<ExtractStats, ReportError> {
    let mut stats = ExtractStats::default();

    let walked = loop {
        let packet = match walker.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        stats.packets += 1;

        if packet.direction != Direction::ServerToClient || packet.payload.is_empty() {
            continue;
        }
        sink.write_all(&packet.payload).map_err(ReportError::Output)?;
        stats.payload_packets += 1;
        stats.bytes_written += packet.payload.len() as u64;
        debug!(
            index = packet.index,
            bytes = packet.payload.len(),
            "Wrote server payload"
        );
    };

    sink.flush().map_err(ReportError::Output)?;
    walked?;

    info!(
        packets = stats.packets,
        payload_packets = stats.payload_packets,
        bytes = stats.bytes_written,
        "Extracted server payload"
    );
    Ok(stats)
}

pub fn format_packet_line(packet: &PacketDescriptor) -> String {
    let flags = packet.tcp.flags();
    format!(
        "{} -> {} ({} bytes, Flags: {}) [{}]",
        packet.ip.source(),
        packet.ip.destination(),
        packet.ip.total_length,
        flags.bit_string(),
        flags.label()
    )
}

pub fn list_packets<R: Read, W: Write>(
    mut walker: PacketWalker<R>,
    out: &mut W,
) -> Result<usize, ReportError> {
    let mut count = 0;

    let walked = loop {
        let packet = match walker.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        writeln!(out, "{}", format_packet_line(&packet)).map_err(ReportError::Output)?;
        count += 1;
    };

    out.flush().map_err(ReportError::Output)?;
    walked?;
    Ok(count)
}
