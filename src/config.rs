//! Stack configuration

use crate::link::MacAddr;

/// Local UDP port DNS queries are sent from.
pub const DEFAULT_DNS_SOURCE_PORT: u16 = 49153;

/// Addresses and knobs fixed at interface creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub mac: MacAddr,
    pub ip: [u8; 4],
    /// ICMP identifier for outbound echo requests.
    pub ping_identifier: u16,
    pub dns_source_port: u16,
    /// First DNS transaction id, incremented per query.
    pub dns_transaction_seed: u16,
    /// Drop IPv4 headers whose checksum does not verify.
    pub verify_rx_checksums: bool,
    /// Fill in the UDP checksum on send instead of leaving it zero.
    pub udp_tx_checksum: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            mac: MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
            ip: [10, 0, 0, 1],
            ping_identifier: 0x7473,
            dns_source_port: DEFAULT_DNS_SOURCE_PORT,
            dns_transaction_seed: 0x0100,
            verify_rx_checksums: false,
            udp_tx_checksum: false,
        }
    }
}

impl StackConfig {
    pub fn new(mac: MacAddr, ip: [u8; 4]) -> Self {
        StackConfig {
            mac,
            ip,
            ..Default::default()
        }
    }

    pub fn with_ping_identifier(mut self, identifier: u16) -> Self {
        self.ping_identifier = identifier;
        self
    }

    pub fn with_dns_source_port(mut self, port: u16) -> Self {
        self.dns_source_port = port;
        self
    }

    pub fn with_dns_transaction_seed(mut self, seed: u16) -> Self {
        self.dns_transaction_seed = seed;
        self
    }

    pub fn with_rx_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_rx_checksums = enabled;
        self
    }

    pub fn with_udp_tx_checksum(mut self, enabled: bool) -> Self {
        self.udp_tx_checksum = enabled;
        self
    }
}
