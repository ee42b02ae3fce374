//! Link layer
//!
//! - Ethernet II framing
//! - ARP for IPv4 over Ethernet

pub mod arp;
pub mod ethernet;

pub use arp::{ArpPacket, ARP_OP_REPLY, ARP_OP_REQUEST};
pub use ethernet::{ethertype, EthernetHeader, MacAddr, ETH_HEADER_LEN};
