//! Ethernet II header

use byteorder::{BigEndian, ByteOrder};
use std::fmt;

pub const ETH_HEADER_LEN: usize = 14;

/// EtherType constants
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
}

/// 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ethertype: u16,
}

impl EthernetHeader {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ETH_HEADER_LEN {
            return None;
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&data[0..6]);
        src.copy_from_slice(&data[6..12]);
        Some(EthernetHeader {
            dst: MacAddr(dst),
            src: MacAddr(src),
            ethertype: BigEndian::read_u16(&data[12..14]),
        })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        out[0..6].copy_from_slice(&self.dst.0);
        out[6..12].copy_from_slice(&self.src.0);
        BigEndian::write_u16(&mut out[12..14], self.ethertype);
    }

    /// Address the frame back to whoever sent it, from `local`.
    pub fn turn_around(&mut self, local: MacAddr) {
        self.dst = self.src;
        self.src = local;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_parsing() {
        let mut data = [0u8; 18];
        data[0..6].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        data[6..12].copy_from_slice(&[0x11, 0x12, 0x13, 0x14, 0x15, 0x16]);
        data[12..14].copy_from_slice(&0x0800u16.to_be_bytes());

        let header = EthernetHeader::from_bytes(&data).unwrap();
        assert_eq!(header.dst, MacAddr([1, 2, 3, 4, 5, 6]));
        assert_eq!(header.src, MacAddr([0x11, 0x12, 0x13, 0x14, 0x15, 0x16]));
        assert_eq!(header.ethertype, ethertype::IPV4);
    }

    #[test]
    fn test_eth_too_short() {
        assert!(EthernetHeader::from_bytes(&[0u8; 13]).is_none());
    }

    #[test]
    fn test_turn_around() {
        let local = MacAddr([2, 0, 0, 0, 0, 1]);
        let mut header = EthernetHeader {
            dst: local,
            src: MacAddr([2, 0, 0, 0, 0, 9]),
            ethertype: ethertype::ARP,
        };
        header.turn_around(local);
        assert_eq!(header.dst, MacAddr([2, 0, 0, 0, 0, 9]));
        assert_eq!(header.src, local);
    }

    #[test]
    fn test_mac_display() {
        assert_eq!(MacAddr([0xde, 0xad, 0xbe, 0xef, 0, 1]).to_string(), "de:ad:be:ef:00:01");
    }
}
