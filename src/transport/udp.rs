//! UDP (User Datagram Protocol) implementation
//!
//! This module provides the UDP header and its checksum helper.

use crate::network::{protocol, pseudo_header_checksum};
use byteorder::{BigEndian, ByteOrder};

/// UDP header length in bytes
pub const UDP_HEADER_LEN: usize = 8;

/// UDP packet header structure
///
/// Represents the standard 8-byte UDP header as defined in RFC 768
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16, // Length of UDP header and data
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse UDP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid UDP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < UDP_HEADER_LEN {
            return None;
        }

        Some(UdpHeader {
            src_port: BigEndian::read_u16(&data[0..2]),
            dst_port: BigEndian::read_u16(&data[2..4]),
            length: BigEndian::read_u16(&data[4..6]),
            checksum: BigEndian::read_u16(&data[6..8]),
        })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        BigEndian::write_u16(&mut out[0..2], self.src_port);
        BigEndian::write_u16(&mut out[2..4], self.dst_port);
        BigEndian::write_u16(&mut out[4..6], self.length);
        BigEndian::write_u16(&mut out[6..8], self.checksum);
    }

    /// Payload length claimed by the length field.
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(UDP_HEADER_LEN)
    }

    /// Reply convention: answer whoever sent this datagram.
    pub fn swap_ports(&mut self) {
        std::mem::swap(&mut self.src_port, &mut self.dst_port);
    }
}

/// Calculate UDP checksum with pseudo header over `datagram` (header and
/// payload, checksum field zeroed). A computed zero is sent as 0xFFFF.
pub fn udp_checksum(src_ip: [u8; 4], dst_ip: [u8; 4], datagram: &[u8]) -> u16 {
    match pseudo_header_checksum(src_ip, dst_ip, protocol::UDP, datagram) {
        0 => 0xFFFF,
        sum => sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = UdpHeader {
            src_port: 1234,
            dst_port: 53,
            length: 20,
            checksum: 0,
        };
        let mut bytes = [0u8; 8];
        header.write_to(&mut bytes);
        assert_eq!(bytes, [0x04, 0xd2, 0x00, 0x35, 0x00, 0x14, 0, 0]);
        assert_eq!(UdpHeader::from_bytes(&bytes), Some(header));
        assert_eq!(header.payload_len(), 12);
    }

    #[test]
    fn test_swap_ports_is_involution() {
        let mut header = UdpHeader {
            src_port: 5000,
            dst_port: 7,
            length: 8,
            checksum: 0,
        };
        header.swap_ports();
        assert_eq!((header.src_port, header.dst_port), (7, 5000));
        header.swap_ports();
        assert_eq!((header.src_port, header.dst_port), (5000, 7));
    }

    #[test]
    fn test_short_length_field() {
        let header = UdpHeader::from_bytes(&[0, 1, 0, 2, 0, 4, 0, 0]).unwrap();
        assert_eq!(header.payload_len(), 0);
    }
}
