//! Synthetic packet logs for unit tests.

use crate::parser::decoder::{IpHeader, TcpHeader};
use crate::parser::tcp::{ACK, FIN, PSH, SYN};

pub const CLIENT: u32 = 0x80E8_01DB; // 128.232.1.219
pub const SERVER: u32 = 0x80E8_0906; // 128.232.9.6

// Option bytes are filled with a marker so a mis-skip shows up in the payload.
const OPTION_FILL: u8 = 0xAA;

pub struct Segment<'a> {
    pub src: u32,
    pub dst: u32,
    pub control_bits: u8,
    pub ihl: u8,
    pub data_offset: u8,
    pub payload: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(src: u32, dst: u32, control_bits: u8) -> Self {
        Self {
            src,
            dst,
            control_bits,
            ihl: 5,
            data_offset: 5,
            payload: &[],
        }
    }

    pub fn ihl(mut self, ihl: u8) -> Self {
        self.ihl = ihl;
        self
    }

    pub fn data_offset(mut self, data_offset: u8) -> Self {
        self.data_offset = data_offset;
        self
    }

    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = payload;
        self
    }

    pub fn total_length(&self) -> u16 {
        (4 * self.ihl as usize + 4 * self.data_offset as usize + self.payload.len()) as u16
    }

    pub fn ip_header(&self) -> IpHeader {
        IpHeader {
            version_and_ihl: 0x40 | self.ihl,
            total_length: self.total_length(),
            identification: 0x1c46,
            flags_and_fragment_offset: 0x4000,
            time_to_live: 64,
            protocol: 6,
            source_address: self.src,
            destination_address: self.dst,
            ..Default::default()
        }
    }

    pub fn tcp_header(&self) -> TcpHeader {
        TcpHeader {
            source_port: if self.src == CLIENT { 51234 } else { 80 },
            destination_port: if self.dst == CLIENT { 51234 } else { 80 },
            sequence_number: 0x0102_0304,
            acknowledgment_number: 0x0a0b_0c0d,
            data_offset_and_reserved: self.data_offset << 4,
            control_bits: self.control_bits,
            window: 5840,
            ..Default::default()
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ip_header().to_bytes());
        out.extend(std::iter::repeat_n(OPTION_FILL, option_len(self.ihl)));
        out.extend_from_slice(&self.tcp_header().to_bytes());
        out.extend(std::iter::repeat_n(OPTION_FILL, option_len(self.data_offset)));
        out.extend_from_slice(self.payload);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

fn option_len(words: u8) -> usize {
    (4 * words as usize).saturating_sub(20)
}

pub fn payload_bytes(index: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i + index * 7) % 256) as u8).collect()
}

/// The 18-packet capture between 128.232.1.219 and 128.232.9.6.
///
/// Returns the log and the server-to-client payload it carries, in order.
pub fn message_log() -> (Vec<u8>, Vec<u8>) {
    // (from client?, total length, control bits)
    let packets: [(bool, usize, u8); 18] = [
        (true, 60, SYN),
        (false, 60, SYN | ACK),
        (true, 52, ACK),
        (false, 1076, ACK | PSH),
        (false, 1500, ACK),
        (false, 1500, ACK),
        (true, 52, ACK),
        (false, 2948, ACK),
        (true, 52, ACK),
        (false, 2948, ACK),
        (false, 137, ACK | PSH | FIN),
        (true, 52, ACK),
        (true, 52, ACK),
        (true, 52, ACK),
        (true, 52, ACK),
        (true, 52, ACK),
        (true, 52, ACK | FIN),
        (false, 52, ACK),
    ];

    let mut log = Vec::new();
    let mut server_payload = Vec::new();
    for (index, (from_client, total_length, bits)) in packets.into_iter().enumerate() {
        let (src, dst) = if from_client {
            (CLIENT, SERVER)
        } else {
            (SERVER, CLIENT)
        };
        // Handshake segments carry 20 option bytes, the rest a 12-byte timestamp option.
        let data_offset = if bits & SYN != 0 { 10 } else { 8 };
        let payload = payload_bytes(index, total_length - 20 - 4 * data_offset as usize);

        Segment::new(src, dst, bits)
            .data_offset(data_offset)
            .payload(&payload)
            .encode_into(&mut log);
        if !from_client {
            server_payload.extend_from_slice(&payload);
        }
    }
    (log, server_payload)
}
