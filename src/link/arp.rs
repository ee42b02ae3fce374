//! ARP (RFC 826) for IPv4 over Ethernet
//!
//! Both the outbound request and the in-place reply go through the same
//! `BigEndian` writes, so the hardware type, protocol type and opcode are in
//! network order on every path.

use crate::link::ethernet::{ethertype, MacAddr};
use byteorder::{BigEndian, ByteOrder};

pub const ARP_PACKET_LEN: usize = 28;
pub const ARP_HTYPE_ETHERNET: u16 = 1;
pub const ARP_OP_REQUEST: u16 = 1;
pub const ARP_OP_REPLY: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub hw_type: u16,
    pub proto_type: u16,
    pub hw_len: u8,
    pub proto_len: u8,
    pub opcode: u16,
    pub sender_hw: MacAddr,
    pub sender_ip: [u8; 4],
    pub target_hw: MacAddr,
    pub target_ip: [u8; 4],
}

impl ArpPacket {
    /// Who has `target_ip`? Tell `sender_ip`.
    pub fn request(sender_hw: MacAddr, sender_ip: [u8; 4], target_ip: [u8; 4]) -> Self {
        ArpPacket {
            hw_type: ARP_HTYPE_ETHERNET,
            proto_type: ethertype::IPV4,
            hw_len: 6,
            proto_len: 4,
            opcode: ARP_OP_REQUEST,
            sender_hw,
            sender_ip,
            target_hw: MacAddr::ZERO,
            target_ip,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ARP_PACKET_LEN {
            return None;
        }

        let mut sender_hw = [0u8; 6];
        let mut sender_ip = [0u8; 4];
        let mut target_hw = [0u8; 6];
        let mut target_ip = [0u8; 4];
        sender_hw.copy_from_slice(&data[8..14]);
        sender_ip.copy_from_slice(&data[14..18]);
        target_hw.copy_from_slice(&data[18..24]);
        target_ip.copy_from_slice(&data[24..28]);

        Some(ArpPacket {
            hw_type: BigEndian::read_u16(&data[0..2]),
            proto_type: BigEndian::read_u16(&data[2..4]),
            hw_len: data[4],
            proto_len: data[5],
            opcode: BigEndian::read_u16(&data[6..8]),
            sender_hw: MacAddr(sender_hw),
            sender_ip,
            target_hw: MacAddr(target_hw),
            target_ip,
        })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        BigEndian::write_u16(&mut out[0..2], self.hw_type);
        BigEndian::write_u16(&mut out[2..4], self.proto_type);
        out[4] = self.hw_len;
        out[5] = self.proto_len;
        BigEndian::write_u16(&mut out[6..8], self.opcode);
        out[8..14].copy_from_slice(&self.sender_hw.0);
        out[14..18].copy_from_slice(&self.sender_ip);
        out[18..24].copy_from_slice(&self.target_hw.0);
        out[24..28].copy_from_slice(&self.target_ip);
    }

    /// Ethernet hardware and IPv4 protocol space.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hw_type == ARP_HTYPE_ETHERNET && self.proto_type == ethertype::IPV4
    }

    /// A request this host must answer.
    pub fn is_request_for(&self, local_ip: [u8; 4]) -> bool {
        self.is_ethernet_ipv4() && self.opcode == ARP_OP_REQUEST && self.target_ip == local_ip
    }

    /// A reply carrying the hardware address of `ip`.
    pub fn is_reply_from(&self, ip: [u8; 4]) -> bool {
        self.is_ethernet_ipv4() && self.opcode == ARP_OP_REPLY && self.sender_ip == ip
    }

    /// Rewrite a request into its reply: the requester becomes the target
    /// and this host becomes the sender.
    pub fn answer(&mut self, local_hw: MacAddr, local_ip: [u8; 4]) {
        self.target_hw = self.sender_hw;
        self.target_ip = self.sender_ip;
        self.sender_hw = local_hw;
        self.sender_ip = local_ip;
        self.opcode = ARP_OP_REPLY;
    }
}
