use super::cursor::ByteCursor;
use super::tcp::ControlBits;
use crate::error::DecodeError;
use std::net::Ipv4Addr;
use tracing::trace;

pub const FIXED_HEADER_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpHeader {
    pub version_and_ihl: u8,
    pub type_of_service: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_and_fragment_offset: u16,
    pub time_to_live: u8,
    pub protocol: u8,
    pub header_checksum: u16,
    pub source_address: u32,
    pub destination_address: u32,
}

impl IpHeader {
    pub fn version(&self) -> u8 {
        self.version_and_ihl >> 4
    }

    pub fn ihl(&self) -> u8 {
        self.version_and_ihl & 0x0f
    }

    pub fn header_len(&self) -> usize {
        4 * self.ihl() as usize
    }

    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.source_address)
    }

    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.destination_address)
    }

    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_LEN] {
        let mut out = [0u8; FIXED_HEADER_LEN];
        out[0] = self.version_and_ihl;
        out[1] = self.type_of_service;
        out[2..4].copy_from_slice(&self.total_length.to_be_bytes());
        out[4..6].copy_from_slice(&self.identification.to_be_bytes());
        out[6..8].copy_from_slice(&self.flags_and_fragment_offset.to_be_bytes());
        out[8] = self.time_to_live;
        out[9] = self.protocol;
        out[10..12].copy_from_slice(&self.header_checksum.to_be_bytes());
        out[12..16].copy_from_slice(&self.source_address.to_be_bytes());
        out[16..20].copy_from_slice(&self.destination_address.to_be_bytes());
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    pub data_offset_and_reserved: u8,
    pub control_bits: u8,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
}

impl TcpHeader {
    pub fn data_offset(&self) -> u8 {
        self.data_offset_and_reserved >> 4
    }

    pub fn header_len(&self) -> usize {
        4 * self.data_offset() as usize
    }

    pub fn flags(&self) -> ControlBits {
        ControlBits::from_bits(self.control_bits)
    }

    pub fn to_bytes(&self) -> [u8; FIXED_HEADER_LEN] {
        let mut out = [0u8; FIXED_HEADER_LEN];
        out[0..2].copy_from_slice(&self.source_port.to_be_bytes());
        out[2..4].copy_from_slice(&self.destination_port.to_be_bytes());
        out[4..8].copy_from_slice(&self.sequence_number.to_be_bytes());
        out[8..12].copy_from_slice(&self.acknowledgment_number.to_be_bytes());
        out[12] = self.data_offset_and_reserved;
        out[13] = self.control_bits;
        out[14..16].copy_from_slice(&self.window.to_be_bytes());
        out[16..18].copy_from_slice(&self.checksum.to_be_bytes());
        out[18..20].copy_from_slice(&self.urgent_pointer.to_be_bytes());
        out
    }
}

pub fn decode_ip_header(bytes: &[u8]) -> Result<IpHeader, DecodeError> {
    let mut cursor = window(bytes)?;
    let header = IpHeader {
        version_and_ihl: cursor.read_u8()?,
        type_of_service: cursor.read_u8()?,
        total_length: cursor.read_u16()?,
        identification: cursor.read_u16()?,
        flags_and_fragment_offset: cursor.read_u16()?,
        time_to_live: cursor.read_u8()?,
        protocol: cursor.read_u8()?,
        header_checksum: cursor.read_u16()?,
        source_address: cursor.read_u32()?,
        destination_address: cursor.read_u32()?,
    };
    trace!(
        ihl = header.ihl(),
        total_length = header.total_length,
        protocol = header.protocol,
        "Decoded IP header"
    );
    Ok(header)
}

pub fn decode_tcp_header(bytes: &[u8]) -> Result<TcpHeader, DecodeError> {
    let mut cursor = window(bytes)?;
    let header = TcpHeader {
        source_port: cursor.read_u16()?,
        destination_port: cursor.read_u16()?,
        sequence_number: cursor.read_u32()?,
        acknowledgment_number: cursor.read_u32()?,
        data_offset_and_reserved: cursor.read_u8()?,
        control_bits: cursor.read_u8()?,
        window: cursor.read_u16()?,
        checksum: cursor.read_u16()?,
        urgent_pointer: cursor.read_u16()?,
    };
    trace!(
        src_port = header.source_port,
        dst_port = header.destination_port,
        data_offset = header.data_offset(),
        "Decoded TCP header"
    );
    Ok(header)
}

pub fn format_ipv4(address: u32) -> String {
    Ipv4Addr::from(address).to_string()
}

// Only the fixed part is decoded; anything past 20 bytes is the caller's to skip.
fn window(bytes: &[u8]) -> Result<ByteCursor<'_>, DecodeError> {
    match bytes.get(..FIXED_HEADER_LEN) {
        Some(fixed) => Ok(ByteCursor::new(fixed)),
        None => Err(DecodeError::TruncatedHeader {
            needed: FIXED_HEADER_LEN,
            available: bytes.len(),
        }),
    }
}
