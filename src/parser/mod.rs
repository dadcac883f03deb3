pub mod cursor;
pub mod decoder;
pub mod reader;
pub mod tcp;


pub use decoder::{IpHeader, TcpHeader, decode_ip_header, decode_tcp_header, format_ipv4};
pub use reader::{PacketDescriptor, PacketWalker};
