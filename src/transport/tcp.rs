//! TCP (Transmission Control Protocol) implementation
//!
//! This module provides the TCP header used by the reduced responder in
//! [`crate::iface`]. There is no connection state machine: replies are
//! derived from the segment being answered.

use byteorder::{BigEndian, ByteOrder};

pub const TCP_HEADER_LEN: usize = 20;

/// TCP control bits, low byte of `data_offset_and_flags`
pub mod flags {
    pub const FIN: u16 = 0x0001;
    pub const SYN: u16 = 0x0002;
    pub const RST: u16 = 0x0004;
    pub const PSH: u16 = 0x0008;
    pub const ACK: u16 = 0x0010;
    pub const URG: u16 = 0x0020;
    pub const MASK: u16 = 0x01FF;
}

/// TCP packet header structure
///
/// Represents the standard 20-byte TCP header as defined in RFC 793
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_number: u32,
    pub ack_number: u32,
    pub data_offset_and_flags: u16, // Data offset (4 bits) + Reserved (3 bits) + Flags (9 bits)
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_ptr: u16,
}

impl TcpHeader {
    /// Parse TCP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid TCP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < TCP_HEADER_LEN {
            return None;
        }

        Some(TcpHeader {
            src_port: BigEndian::read_u16(&data[0..2]),
            dst_port: BigEndian::read_u16(&data[2..4]),
            seq_number: BigEndian::read_u32(&data[4..8]),
            ack_number: BigEndian::read_u32(&data[8..12]),
            data_offset_and_flags: BigEndian::read_u16(&data[12..14]),
            window_size: BigEndian::read_u16(&data[14..16]),
            checksum: BigEndian::read_u16(&data[16..18]),
            urgent_ptr: BigEndian::read_u16(&data[18..20]),
        })
    }

    /// Write the fixed 20 header bytes. Option bytes past them, if the peer
    /// sent any, are left in place.
    pub fn write_to(&self, out: &mut [u8]) {
        BigEndian::write_u16(&mut out[0..2], self.src_port);
        BigEndian::write_u16(&mut out[2..4], self.dst_port);
        BigEndian::write_u32(&mut out[4..8], self.seq_number);
        BigEndian::write_u32(&mut out[8..12], self.ack_number);
        BigEndian::write_u16(&mut out[12..14], self.data_offset_and_flags);
        BigEndian::write_u16(&mut out[14..16], self.window_size);
        BigEndian::write_u16(&mut out[16..18], self.checksum);
        BigEndian::write_u16(&mut out[18..20], self.urgent_ptr);
    }

    pub fn flags(&self) -> u16 {
        self.data_offset_and_flags & flags::MASK
    }

    pub fn has(&self, flag: u16) -> bool {
        self.data_offset_and_flags & flag != 0
    }

    /// Check if SYN flag is set
    pub fn is_syn(&self) -> bool {
        self.has(flags::SYN)
    }

    /// Check if ACK flag is set
    pub fn is_ack(&self) -> bool {
        self.has(flags::ACK)
    }

    /// Check if FIN flag is set
    pub fn is_fin(&self) -> bool {
        self.has(flags::FIN)
    }

    /// Check if PSH flag is set
    pub fn is_psh(&self) -> bool {
        self.has(flags::PSH)
    }

    pub fn set_flag(&mut self, flag: u16) {
        self.data_offset_and_flags |= flag;
    }

    /// Get the data offset (header length) in bytes
    pub fn data_offset(&self) -> usize {
        ((self.data_offset_and_flags >> 12) as usize) * 4
    }

    /// Reply convention: ports and sequence/acknowledgment numbers trade
    /// places.
    pub fn swap_for_reply(&mut self) {
        std::mem::swap(&mut self.src_port, &mut self.dst_port);
        std::mem::swap(&mut self.seq_number, &mut self.ack_number);
    }
}
