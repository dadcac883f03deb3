use crate::parser::decoder::{IpHeader, format_ipv4};
use std::fmt;
use std::net::Ipv4Addr;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ServerToClient,
    ClientToServer,
    Unrelated,
}

/// The client/server pair of a log, fixed by its first packet.
///
/// The first record is the client's connection-opening SYN, so the destination of
/// packet 0 is the server and its source is the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversation {
    pub server_address: u32,
    pub client_address: u32,
}

impl Conversation {
    pub fn from_first_packet(ip: &IpHeader) -> Self {
        Self {
            server_address: ip.destination_address,
            client_address: ip.source_address,
        }
    }

    pub fn classify(&self, source: u32, destination: u32) -> Direction {
        if source == self.server_address && destination == self.client_address {
            Direction::ServerToClient
        } else if source == self.client_address && destination == self.server_address {
            Direction::ClientToServer
        } else {
            Direction::Unrelated
        }
    }

    pub fn server(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.server_address)
    }

    pub fn client(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.client_address)
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server {} ↔ client {}",
            format_ipv4(self.server_address),
            format_ipv4(self.client_address)
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Direction::ServerToClient => "server->client",
            Direction::ClientToServer => "client->server",
            Direction::Unrelated => "unrelated",
        };
        f.write_str(text)
    }
}
