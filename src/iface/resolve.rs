//! Blocking resolutions: ARP, ICMP echo and DNS.
//!
//! Each one transmits a request and then busy-polls the device within a
//! [`PollBudget`]. Frames that arrive meanwhile and do not answer the
//! request are dropped, not dispatched.

use crate::app::dns::{self, DnsAnswer, DnsHeader, DNS_PORT};
use crate::error::Result;
use crate::iface::budget::PollBudget;
use crate::iface::device::NetDevice;
use crate::iface::interface::{NetworkInterface, IP_OFFSET, L4_OFFSET, MAX_FRAME_LEN};
use crate::iface::ipv4::ipv4_payload;
use crate::iface::transport::UDP_DATA_OFFSET;
use crate::link::arp::{ArpPacket, ARP_PACKET_LEN};
use crate::link::ethernet::{ethertype, EthernetHeader, MacAddr, ETH_HEADER_LEN};
use crate::network::icmp::{IcmpHeader, ICMP_HEADER_LEN};
use crate::network::ipv4::Ipv4Header;
use crate::network::{checksum, protocol};
use crate::transport::udp::{UdpHeader, UDP_HEADER_LEN};
use byteorder::{BigEndian, ByteOrder};
use log::debug;

/// Payload carried by outbound echo requests.
const PING_PAYLOAD: &[u8; 32] = b"abcdefghijklmnopqrstuvwabcdefghi";

impl<D: NetDevice> NetworkInterface<D> {
    /// Learn the hardware address of `ip` with an ARP request.
    pub fn resolve(&mut self, ip: [u8; 4], budget: PollBudget) -> Result<MacAddr> {
        let local_mac = self.config.mac;
        let local_ip = self.config.ip;

        EthernetHeader {
            dst: MacAddr::BROADCAST,
            src: local_mac,
            ethertype: ethertype::ARP,
        }
        .write_to(&mut self.frame);
        ArpPacket::request(local_mac, local_ip, ip).write_to(&mut self.frame[IP_OFFSET..]);
        self.device.send(&self.frame[..ETH_HEADER_LEN + ARP_PACKET_LEN])?;

        let (mac, elapsed) = self.wait_for(budget, |frame| {
            let eth = EthernetHeader::from_bytes(frame)?;
            if eth.ethertype != ethertype::ARP {
                return None;
            }
            let arp = ArpPacket::from_bytes(&frame[IP_OFFSET..])?;
            arp.is_reply_from(ip).then_some(arp.sender_hw)
        })?;
        debug!("resolved {:?} to {} after {} polls", ip, mac, elapsed);
        Ok(mac)
    }

    /// Send an ICMP echo request to `ip` and wait for the matching reply.
    ///
    /// The hardware address is resolved first with its own `budget`.
    /// Returns the number of polls the echo reply took, at least 1.
    pub fn ping(&mut self, ip: [u8; 4], budget: PollBudget) -> Result<u32> {
        let peer_mac = self.resolve(ip, budget)?;
        let local_ip = self.config.ip;
        let identifier = self.config.ping_identifier;
        self.ping_sequence = self.ping_sequence.wrapping_add(1);
        let sequence = self.ping_sequence;

        let icmp_len = ICMP_HEADER_LEN + PING_PAYLOAD.len();
        self.stage_reply_shaped(peer_mac, protocol::ICMP, ip, sequence);
        let message = &mut self.frame[L4_OFFSET..L4_OFFSET + icmp_len];
        IcmpHeader::echo_request(identifier, sequence).write_to(message);
        message[ICMP_HEADER_LEN..].copy_from_slice(PING_PAYLOAD);
        let sum = checksum(message);
        BigEndian::write_u16(&mut message[2..4], sum);
        self.ip_send(protocol::ICMP, icmp_len)?;

        let (_, elapsed) = self.wait_for(budget, |frame| {
            let (header, payload) = ipv4_payload(frame)?;
            if header.protocol != protocol::ICMP || header.src_addr != ip || header.dst_addr != local_ip {
                return None;
            }
            let icmp = IcmpHeader::from_bytes(payload)?;
            (icmp.is_echo_reply() && icmp.identifier() == identifier && icmp.sequence() == sequence)
                .then_some(())
        })?;
        debug!("echo reply from {:?} after {} polls", ip, elapsed);
        Ok(elapsed)
    }

    /// Resolve `name` to an IPv4 address through the DNS server at
    /// `server`.
    ///
    /// The answer is a view into the frame buffer at the first answer's
    /// address field.
    pub fn resolve_name(&mut self, server: [u8; 4], name: &str, budget: PollBudget) -> Result<DnsAnswer<'_>> {
        let server_mac = self.resolve(server, budget)?;
        let id = self.dns_transaction;
        self.dns_transaction = self.dns_transaction.wrapping_add(1);
        let local_port = self.config.dns_source_port;

        self.stage_reply_shaped(server_mac, protocol::UDP, server, id);
        UdpHeader {
            src_port: DNS_PORT,
            dst_port: local_port,
            length: 0,
            checksum: 0,
        }
        .write_to(&mut self.frame[L4_OFFSET..UDP_DATA_OFFSET]);
        let query_len = dns::build_query(id, name, &mut self.frame[UDP_DATA_OFFSET..MAX_FRAME_LEN - 1])?;
        self.udp_send_in_place(query_len)?;
        debug!("sent DNS query {:#06x} for {} to {:?}", id, name, server);

        let (found, elapsed) = self.wait_for(budget, |frame| {
            let (header, payload) = ipv4_payload(frame)?;
            if header.protocol != protocol::UDP || header.src_addr != server {
                return None;
            }
            let udp = UdpHeader::from_bytes(payload)?;
            if udp.src_port != DNS_PORT || udp.dst_port != local_port {
                return None;
            }
            let end = (UDP_HEADER_LEN + udp.payload_len()).min(payload.len());
            let message = &payload[UDP_HEADER_LEN..end];
            if DnsHeader::from_bytes(message)?.id != id {
                return None;
            }
            Some(dns::answer_offset(message))
        })?;
        let offset = UDP_DATA_OFFSET + found?;
        debug!("DNS answer for {} after {} polls", name, elapsed);
        Ok(DnsAnswer::new(&self.frame, offset))
    }

    /// Stage an IPv4 record as if `peer` had sent it to us, so the reply
    /// path turns it into a request to `peer`.
    fn stage_reply_shaped(&mut self, peer_mac: MacAddr, proto: u8, peer_ip: [u8; 4], id: u16) {
        EthernetHeader {
            dst: self.config.mac,
            src: peer_mac,
            ethertype: ethertype::IPV4,
        }
        .write_to(&mut self.frame);
        Ipv4Header::new(proto, id, peer_ip, self.config.ip, 0).write_to(&mut self.frame[IP_OFFSET..L4_OFFSET]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use crate::iface::device::MemoryDevice;
    use crate::iface::testing::*;
    use crate::link::arp::ARP_OP_REQUEST;
    use crate::network::icmp::ICMP_TYPE_ECHO_REPLY;

    const DNS_SERVER: [u8; 4] = [10, 0, 0, 53];
    const DNS_MAC: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x53]);

    /// Peer that answers ARP for `ip` and echoes ICMP requests back.
    fn echoing_peer(ip: [u8; 4], mac: MacAddr) -> impl FnMut(&[u8]) -> Vec<Vec<u8>> {
        move |frame: &[u8]| {
            let eth = EthernetHeader::from_bytes(frame).unwrap();
            match eth.ethertype {
                ethertype::ARP => {
                    let arp = ArpPacket::from_bytes(&frame[14..]).unwrap();
                    if arp.opcode == ARP_OP_REQUEST && arp.target_ip == ip {
                        vec![arp_reply_frame(ip, mac)]
                    } else {
                        vec![]
                    }
                }
                ethertype::IPV4 => {
                    let (header, payload) = ipv4_payload(frame).unwrap();
                    if header.protocol != protocol::ICMP || header.dst_addr != ip {
                        return vec![];
                    }
                    let mut message = payload.to_vec();
                    message[0] = ICMP_TYPE_ECHO_REPLY;
                    vec![ipv4_frame(protocol::ICMP, ip, LOCAL_IP, &message)]
                }
                _ => vec![],
            }
        }
    }

    #[test]
    fn test_resolve_learns_mac() {
        let mut iface = NetworkInterface::new(MemoryDevice::with_responder(echoing_peer(PEER_IP, PEER_MAC)), config());
        let mac = iface.resolve(PEER_IP, PollBudget::iterations(10)).unwrap();
        assert_eq!(mac, PEER_MAC);

        let request = &iface.device().sent()[0];
        let eth = EthernetHeader::from_bytes(request).unwrap();
        assert_eq!(eth.dst, MacAddr::BROADCAST);
        assert_eq!(eth.src, LOCAL_MAC);
        let arp = ArpPacket::from_bytes(&request[14..]).unwrap();
        assert_eq!(&request[14..22], &[0, 1, 8, 0, 6, 4, 0, 1]);
        assert_eq!(arp.sender_ip, LOCAL_IP);
        assert_eq!(arp.target_ip, PEER_IP);
    }

    #[test]
    fn test_resolve_ignores_other_replies() {
        let mut device = MemoryDevice::new();
        device.push_frame(arp_reply_frame([10, 0, 0, 77], PEER_MAC));
        let mut iface = NetworkInterface::new(device, config());
        assert!(matches!(
            iface.resolve(PEER_IP, PollBudget::iterations(3)),
            Err(NetError::Timeout { budget: 3 })
        ));
    }

    #[test]
    fn test_ping_reachable_peer() {
        let mut iface = NetworkInterface::new(MemoryDevice::with_responder(echoing_peer(PEER_IP, PEER_MAC)), config());
        let elapsed = iface.ping(PEER_IP, PollBudget::iterations(1000)).unwrap();
        assert!(elapsed >= 1);

        let sent = iface.device().sent();
        assert_eq!(sent.len(), 2);
        let eth = EthernetHeader::from_bytes(&sent[1]).unwrap();
        assert_eq!(eth.dst, PEER_MAC);
        assert_eq!(eth.src, LOCAL_MAC);
        let (ip, icmp) = parse_ipv4(&sent[1]);
        assert_eq!(ip.src_addr, LOCAL_IP);
        assert_eq!(ip.dst_addr, PEER_IP);
        assert!(ip.checksum_valid());
        let header = IcmpHeader::from_bytes(icmp).unwrap();
        assert!(header.is_echo_request());
        assert_eq!(header.identifier(), config().ping_identifier);
        assert_eq!(header.sequence(), 1);
        assert_eq!(checksum(icmp), 0);
    }

    #[test]
    fn test_ping_silent_peer() {
        let mut iface = stack();
        assert!(matches!(
            iface.ping(PEER_IP, PollBudget::iterations(1000)),
            Err(NetError::NoReply { budget: 1000 })
        ));
        assert_eq!(iface.device().receive_calls(), 1000);
    }

    #[test]
    fn test_ping_wrong_sequence_times_out() {
        let mut answered_arp = false;
        let device = MemoryDevice::with_responder(move |frame: &[u8]| {
            if !answered_arp {
                answered_arp = true;
                return vec![arp_reply_frame(PEER_IP, PEER_MAC)];
            }
            let (_, payload) = ipv4_payload(frame).unwrap();
            let mut message = payload.to_vec();
            message[0] = ICMP_TYPE_ECHO_REPLY;
            message[7] ^= 0xFF;
            vec![ipv4_frame(protocol::ICMP, PEER_IP, LOCAL_IP, &message)]
        });
        let mut iface = NetworkInterface::new(device, config());
        assert!(matches!(
            iface.ping(PEER_IP, PollBudget::iterations(50)),
            Err(NetError::Timeout { budget: 50 })
        ));
    }

    fn dns_response(id: u16, address: [u8; 4]) -> Vec<u8> {
        let mut message = vec![0u8; 12];
        DnsHeader {
            id,
            flags: 0x8180,
            qd_count: 1,
            an_count: 1,
            ns_count: 0,
            ar_count: 0,
        }
        .write_to(&mut message);
        message.extend_from_slice(&[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, 0, 1, 0, 1]);
        message.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0x0e, 0x10, 0, 4]);
        message.extend_from_slice(&address);
        message
    }

    /// DNS server that answers every query with `address`, plus an answer
    /// for a stale transaction first.
    fn dns_peer(address: [u8; 4]) -> impl FnMut(&[u8]) -> Vec<Vec<u8>> {
        move |frame: &[u8]| {
            let eth = EthernetHeader::from_bytes(frame).unwrap();
            if eth.ethertype == ethertype::ARP {
                return vec![arp_reply_frame(DNS_SERVER, DNS_MAC)];
            }
            let (_, payload) = ipv4_payload(frame).unwrap();
            let udp = UdpHeader::from_bytes(payload).unwrap();
            let query = &payload[8..];
            let id = BigEndian::read_u16(&query[0..2]);
            let reply = |id: u16| {
                let datagram = udp_datagram(DNS_PORT, udp.src_port, &dns_response(id, address));
                ipv4_frame(protocol::UDP, DNS_SERVER, LOCAL_IP, &datagram)
            };
            vec![reply(id.wrapping_sub(1)), reply(id)]
        }
    }

    #[test]
    fn test_resolve_name_single_answer() {
        let mut iface = NetworkInterface::new(MemoryDevice::with_responder(dns_peer([93, 184, 216, 34])), config());
        let answer = iface.resolve_name(DNS_SERVER, "example.com", PollBudget::iterations(100)).unwrap();

        let message_len = 12 + 17 + 12;
        assert_eq!(answer.offset(), UDP_DATA_OFFSET + message_len);
        assert_eq!(answer.bytes(), &[93, 184, 216, 34]);
        assert_eq!(answer.address(), std::net::Ipv4Addr::new(93, 184, 216, 34));
    }

    #[test]
    fn test_resolve_name_query_layout() {
        let mut iface = NetworkInterface::new(MemoryDevice::with_responder(dns_peer([1, 2, 3, 4])), config());
        iface.resolve_name(DNS_SERVER, "example.com", PollBudget::iterations(100)).unwrap();
        iface.resolve_name(DNS_SERVER, "example.com", PollBudget::iterations(100)).unwrap();

        let sent = iface.device().sent();
        // ARP, query, ARP, query
        assert_eq!(sent.len(), 4);
        let eth = EthernetHeader::from_bytes(&sent[1]).unwrap();
        assert_eq!(eth.dst, DNS_MAC);
        let (ip, datagram) = parse_ipv4(&sent[1]);
        assert_eq!(ip.dst_addr, DNS_SERVER);
        assert_eq!(ip.src_addr, LOCAL_IP);
        let udp = UdpHeader::from_bytes(datagram).unwrap();
        assert_eq!((udp.src_port, udp.dst_port), (config().dns_source_port, DNS_PORT));

        let query = &datagram[8..];
        let first = DnsHeader::from_bytes(query).unwrap();
        assert_eq!(first.id, config().dns_transaction_seed);
        assert_eq!(first.qd_count, 1);
        let labels: Vec<&[u8]> = dns::Labels::new(&query[12..]).collect();
        assert_eq!(labels, vec![&b"example"[..], &b"com"[..]]);
        assert_eq!(&query[25..29], &[0, 1, 0, 1]);

        let (_, second) = parse_ipv4(&sent[3]);
        let second = DnsHeader::from_bytes(&second[8..]).unwrap();
        assert_eq!(second.id, first.id.wrapping_add(1));
    }

    #[test]
    fn test_resolve_name_invalid_name() {
        let mut iface = NetworkInterface::new(MemoryDevice::with_responder(dns_peer([1, 2, 3, 4])), config());
        assert!(matches!(
            iface.resolve_name(DNS_SERVER, "bad..name", PollBudget::iterations(10)),
            Err(NetError::InvalidName)
        ));
    }

    #[test]
    fn test_resolve_name_no_server() {
        let mut iface = stack();
        assert!(matches!(
            iface.resolve_name(DNS_SERVER, "example.com", PollBudget::iterations(20)),
            Err(NetError::NoReply { budget: 20 })
        ));
    }
}
