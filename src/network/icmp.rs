//! ICMP (Internet Control Message Protocol) implementation
//!
//! Only Echo Request and Echo Reply are understood.

use byteorder::{BigEndian, ByteOrder};

/// Minimum ICMP header length in bytes
pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP message types
pub const ICMP_TYPE_ECHO_REPLY: u8 = 0;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 8;

/// ICMP packet header structure
///
/// Represents the standard 8-byte ICMP header as defined in RFC 792
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub msg_type: u8,  // ICMP message type
    pub msg_code: u8,  // ICMP message code
    pub checksum: u16, // ICMP checksum
    pub rest: [u8; 4], // Type-specific data (e.g., identifier and sequence for echo)
}

impl IcmpHeader {
    /// Build an echo request header with a zero checksum.
    pub fn echo_request(identifier: u16, sequence: u16) -> Self {
        let mut header = IcmpHeader {
            msg_type: ICMP_TYPE_ECHO_REQUEST,
            msg_code: 0,
            checksum: 0,
            rest: [0; 4],
        };
        header.set_identifier(identifier);
        header.set_sequence(sequence);
        header
    }

    /// Parse ICMP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid ICMP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ICMP_HEADER_LEN {
            return None;
        }

        let mut rest = [0u8; 4];
        rest.copy_from_slice(&data[4..8]);
        Some(IcmpHeader {
            msg_type: data[0],
            msg_code: data[1],
            checksum: BigEndian::read_u16(&data[2..4]),
            rest,
        })
    }

    /// Write the 8 header bytes to the start of `out`.
    pub fn write_to(&self, out: &mut [u8]) {
        out[0] = self.msg_type;
        out[1] = self.msg_code;
        BigEndian::write_u16(&mut out[2..4], self.checksum);
        out[4..8].copy_from_slice(&self.rest);
    }

    /// Check if this is an Echo Request message
    pub fn is_echo_request(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REQUEST
    }

    /// Check if this is an Echo Reply message
    pub fn is_echo_reply(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REPLY
    }

    /// Get the identifier field for Echo Request/Reply messages
    pub fn identifier(&self) -> u16 {
        BigEndian::read_u16(&self.rest[0..2])
    }

    /// Get the sequence number field for Echo Request/Reply messages
    pub fn sequence(&self) -> u16 {
        BigEndian::read_u16(&self.rest[2..4])
    }

    /// Set the identifier field for Echo Request/Reply messages
    pub fn set_identifier(&mut self, id: u16) {
        BigEndian::write_u16(&mut self.rest[0..2], id);
    }

    /// Set the sequence number field for Echo Request/Reply messages
    pub fn set_sequence(&mut self, seq: u16) {
        BigEndian::write_u16(&mut self.rest[2..4], seq);
    }
}

/// Turn the echo request in `message` (header plus payload) into a reply.
///
/// Only the type and checksum bytes change; identifier, sequence and
/// payload stay as the peer sent them. Returns false, leaving `message`
/// untouched, if it is not an echo request.
pub fn echo_reply_in_place(message: &mut [u8]) -> bool {
    let mut header = match IcmpHeader::from_bytes(message) {
        Some(header) if header.is_echo_request() => header,
        _ => return false,
    };

    header.msg_type = ICMP_TYPE_ECHO_REPLY;
    header.checksum = 0;
    header.write_to(message);
    let sum = crate::network::checksum(message);
    BigEndian::write_u16(&mut message[2..4], sum);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::checksum;

    #[test]
    fn test_echo_request_fields() {
        let header = IcmpHeader::echo_request(0x1234, 0x0007);
        let mut bytes = [0u8; 8];
        header.write_to(&mut bytes);
        assert_eq!(bytes, [8, 0, 0, 0, 0x12, 0x34, 0x00, 0x07]);
        assert_eq!(IcmpHeader::from_bytes(&bytes), Some(header));
    }

    #[test]
    fn test_echo_reply_in_place_keeps_identity() {
        let mut message = vec![8, 0, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x2a, b'p', b'i', b'n', b'g', b'!'];
        let original = message.clone();
        assert!(echo_reply_in_place(&mut message));

        let reply = IcmpHeader::from_bytes(&message).unwrap();
        assert!(reply.is_echo_reply());
        assert_eq!(reply.identifier(), 0xbeef);
        assert_eq!(reply.sequence(), 0x002a);
        assert_eq!(&message[4..], &original[4..]);
        assert_eq!(checksum(&message), 0);
    }

    #[test]
    fn test_non_request_untouched() {
        let mut message = [0u8, 0, 0x12, 0x34, 0, 1, 0, 1];
        let original = message;
        assert!(!echo_reply_in_place(&mut message));
        assert_eq!(message, original);
        assert!(!echo_reply_in_place(&mut [8, 0, 0]));
    }
}
