//! Network layer protocols implementation
//!
//! This module contains implementations for network layer protocols:
//! - IPv4: Internet Protocol version 4
//! - ICMP: Internet Control Message Protocol
//!
//! It also hosts the Internet checksum used by every layer above Ethernet.

pub mod icmp;
pub mod ipv4;

// Re-export commonly used items
pub use icmp::{IcmpHeader, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
pub use ipv4::{protocol, Ipv4Header};

use byteorder::{BigEndian, ByteOrder};

/// Running ones'-complement sum over 16-bit big-endian words.
///
/// Feeding a buffer in several pieces gives the same result as feeding it
/// at once as long as every piece but the last has even length.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChecksumAccumulator {
    sum: u32,
}

impl ChecksumAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `data` to the sum. A trailing odd byte counts as the high byte
    /// of an implicit word.
    pub fn add(&mut self, data: &[u8]) -> &mut Self {
        let mut chunks = data.chunks_exact(2);
        for chunk in &mut chunks {
            self.sum += BigEndian::read_u16(chunk) as u32;
            self.fold();
        }
        if let [last] = chunks.remainder() {
            self.sum += (*last as u32) << 8;
            self.fold();
        }
        self
    }

    /// Folded, uncomplemented 16-bit sum.
    pub fn sum(&self) -> u16 {
        let mut sum = self.sum;
        while (sum >> 16) > 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        sum as u16
    }

    /// One's complement of the folded sum, ready for a checksum field.
    pub fn finish(&self) -> u16 {
        !self.sum()
    }

    fn fold(&mut self) {
        // keep headroom so the u32 never overflows on long buffers
        if self.sum > 0xFFFF {
            self.sum = (self.sum & 0xFFFF) + (self.sum >> 16);
        }
    }
}

/// Calculate Internet checksum
///
/// Algorithm: Sum data in 16-bit chunks, add carry bits to the sum,
/// and return the one's complement of the result.
/// Used for IP and ICMP checksums. Summing a record whose checksum field
/// is already filled in yields 0.
pub fn checksum(data: &[u8]) -> u16 {
    ChecksumAccumulator::new().add(data).finish()
}

/// TCP/UDP checksum: the 12-byte pseudo header followed by the segment.
///
/// `segment` is the transport header plus payload, its length is the value
/// carried in the pseudo header.
pub fn pseudo_header_checksum(src: [u8; 4], dst: [u8; 4], protocol: u8, segment: &[u8]) -> u16 {
    let mut pseudo = [0u8; 12];
    pseudo[0..4].copy_from_slice(&src);
    pseudo[4..8].copy_from_slice(&dst);
    pseudo[9] = protocol;
    BigEndian::write_u16(&mut pseudo[10..12], segment.len() as u16);

    ChecksumAccumulator::new().add(&pseudo).add(segment).finish()
}
