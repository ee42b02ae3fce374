//! Transport layer protocols implementation
//!
//! This module contains implementations for transport layer protocols:
//! - TCP: Transmission Control Protocol
//! - UDP: User Datagram Protocol

pub mod tcp;
pub mod udp;

// Re-export commonly used items
pub use tcp::{flags as tcp_flags, TcpHeader, TCP_HEADER_LEN};
pub use udp::{udp_checksum, UdpHeader, UDP_HEADER_LEN};
