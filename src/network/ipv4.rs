//! IPv4 protocol implementation
//!
//! Wire representation of the fixed 20-byte IPv4 header. The stack never
//! emits or accepts options, so the version/IHL byte is always `0x45`.
//!
//! Headers are parsed out of the frame buffer with [`Ipv4Header::from_bytes`]
//! and written back with [`Ipv4Header::write_to`], which only touches the
//! 20 header bytes and leaves the payload where it is.

use crate::network::checksum;
use byteorder::{BigEndian, ByteOrder};

pub const IPV4_HEADER_LEN: usize = 20;
/// Version 4, header length 5 words.
pub const IPV4_VERSION_IHL: u8 = 0x45;
pub const DEFAULT_TTL: u8 = 128;

/// IPv4 packet header structure
///
/// Represents the standard 20-byte IPv4 header as defined in RFC 791
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version_ihl: u8,
    pub tos: u8, // Type of Service
    pub total_len: u16,
    pub id: u16,
    pub flags_frag_offset: u16, // Flags and Fragment Offset
    pub ttl: u8,                // Time to Live
    pub protocol: u8,           // Next Protocol
    pub checksum: u16,
    pub src_addr: [u8; 4], // Source IP Address
    pub dst_addr: [u8; 4], // Destination IP Address
}

impl Ipv4Header {
    /// Create a header with the fixed fields this stack always sends.
    pub fn new(protocol: u8, id: u16, src_addr: [u8; 4], dst_addr: [u8; 4], payload_len: u16) -> Self {
        Ipv4Header {
            version_ihl: IPV4_VERSION_IHL,
            tos: 0,
            total_len: IPV4_HEADER_LEN as u16 + payload_len,
            id,
            flags_frag_offset: 0,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
        }
    }

    /// Parse IPv4 header from byte slice
    ///
    /// Returns None if the data is too short. No field is validated here,
    /// see [`Ipv4Header::is_plain_ipv4`].
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < IPV4_HEADER_LEN {
            return None;
        }

        let mut src_addr = [0u8; 4];
        let mut dst_addr = [0u8; 4];
        src_addr.copy_from_slice(&data[12..16]);
        dst_addr.copy_from_slice(&data[16..20]);

        Some(Ipv4Header {
            version_ihl: data[0],
            tos: data[1],
            total_len: BigEndian::read_u16(&data[2..4]),
            id: BigEndian::read_u16(&data[4..6]),
            flags_frag_offset: BigEndian::read_u16(&data[6..8]),
            ttl: data[8],
            protocol: data[9],
            checksum: BigEndian::read_u16(&data[10..12]),
            src_addr,
            dst_addr,
        })
    }

    /// Serialize the header into the first 20 bytes of `out`.
    ///
    /// Panics if `out` is shorter than the header.
    pub fn write_to(&self, out: &mut [u8]) {
        out[0] = self.version_ihl;
        out[1] = self.tos;
        BigEndian::write_u16(&mut out[2..4], self.total_len);
        BigEndian::write_u16(&mut out[4..6], self.id);
        BigEndian::write_u16(&mut out[6..8], self.flags_frag_offset);
        out[8] = self.ttl;
        out[9] = self.protocol;
        BigEndian::write_u16(&mut out[10..12], self.checksum);
        out[12..16].copy_from_slice(&self.src_addr);
        out[16..20].copy_from_slice(&self.dst_addr);
    }

    /// Convert IPv4 header to bytes
    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut bytes = [0u8; IPV4_HEADER_LEN];
        self.write_to(&mut bytes);
        bytes
    }

    /// Recalculate the checksum field with the field itself treated as zero.
    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = checksum(&self.to_bytes());
    }

    /// True when the stored checksum verifies.
    pub fn checksum_valid(&self) -> bool {
        checksum(&self.to_bytes()) == 0
    }

    /// The only shape this stack accepts: version 4, no options.
    pub fn is_plain_ipv4(&self) -> bool {
        self.version_ihl == IPV4_VERSION_IHL
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        ((self.version_ihl & 0x0F) as usize) * 4
    }

    /// Get payload length
    ///
    /// Returns the length of the payload (total length - header length),
    /// zero if the peer sent a total length shorter than the header.
    pub fn payload_len(&self) -> usize {
        (self.total_len as usize).saturating_sub(self.header_len())
    }

    /// Exchange source and destination, turning a request into a reply.
    pub fn swap_addrs(&mut self) {
        std::mem::swap(&mut self.src_addr, &mut self.dst_addr);
    }
}

/// IPv4 protocol constants
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
}
