//! Frame builders shared by the interface tests.

use crate::config::StackConfig;
use crate::iface::device::MemoryDevice;
use crate::iface::interface::NetworkInterface;
use crate::link::arp::ArpPacket;
use crate::link::ethernet::{ethertype, EthernetHeader, MacAddr};
use crate::network::icmp::IcmpHeader;
use crate::network::ipv4::Ipv4Header;
use crate::network::{checksum, protocol, pseudo_header_checksum};
use crate::transport::tcp::TcpHeader;
use crate::transport::udp::UdpHeader;

pub const LOCAL_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
pub const LOCAL_IP: [u8; 4] = [10, 0, 0, 1];
pub const PEER_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
pub const PEER_IP: [u8; 4] = [10, 0, 0, 2];

pub fn config() -> StackConfig {
    StackConfig::new(LOCAL_MAC, LOCAL_IP)
}

pub fn stack() -> NetworkInterface<MemoryDevice> {
    NetworkInterface::new(MemoryDevice::new(), config())
}

fn eth(ethertype: u16, src: MacAddr, dst: MacAddr) -> Vec<u8> {
    let mut frame = vec![0u8; 14];
    EthernetHeader { dst, src, ethertype }.write_to(&mut frame);
    frame
}

pub fn arp_request_frame(target_ip: [u8; 4]) -> Vec<u8> {
    let mut frame = eth(ethertype::ARP, PEER_MAC, MacAddr::BROADCAST);
    frame.resize(42, 0);
    ArpPacket::request(PEER_MAC, PEER_IP, target_ip).write_to(&mut frame[14..]);
    frame
}

/// ARP reply from `ip` claiming hardware address `hw`, sent to us.
pub fn arp_reply_frame(ip: [u8; 4], hw: MacAddr) -> Vec<u8> {
    let mut frame = eth(ethertype::ARP, hw, LOCAL_MAC);
    frame.resize(42, 0);
    let mut arp = ArpPacket::request(LOCAL_MAC, LOCAL_IP, ip);
    arp.answer(hw, ip);
    arp.write_to(&mut frame[14..]);
    frame
}

/// IPv4 frame from `src` to `dst` carrying `payload`, header checksum set.
pub fn ipv4_frame(proto: u8, src: [u8; 4], dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut frame = eth(ethertype::IPV4, PEER_MAC, LOCAL_MAC);
    let mut header = Ipv4Header::new(proto, 0x1234, src, dst, payload.len() as u16);
    header.ttl = 64;
    header.update_checksum();
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn echo_request_frame(identifier: u16, sequence: u16, data: &[u8]) -> Vec<u8> {
    let mut message = vec![0u8; 8];
    IcmpHeader::echo_request(identifier, sequence).write_to(&mut message);
    message.extend_from_slice(data);
    let sum = checksum(&message);
    message[2..4].copy_from_slice(&sum.to_be_bytes());
    ipv4_frame(protocol::ICMP, PEER_IP, LOCAL_IP, &message)
}

pub fn udp_datagram(src_port: u16, dst_port: u16, data: &[u8]) -> Vec<u8> {
    let mut datagram = vec![0u8; 8];
    UdpHeader {
        src_port,
        dst_port,
        length: (8 + data.len()) as u16,
        checksum: 0,
    }
    .write_to(&mut datagram);
    datagram.extend_from_slice(data);
    datagram
}

pub fn udp_frame(src_port: u16, dst_port: u16, data: &[u8]) -> Vec<u8> {
    ipv4_frame(protocol::UDP, PEER_IP, LOCAL_IP, &udp_datagram(src_port, dst_port, data))
}

pub fn tcp_frame(flags: u16, seq: u32, ack: u32, src_port: u16, dst_port: u16, data: &[u8]) -> Vec<u8> {
    tcp_frame_with_options(flags, seq, ack, src_port, dst_port, &[], data)
}

/// TCP segment whose header carries `options`, a multiple of 4 bytes long.
pub fn tcp_frame_with_options(
    flags: u16,
    seq: u32,
    ack: u32,
    src_port: u16,
    dst_port: u16,
    options: &[u8],
    data: &[u8],
) -> Vec<u8> {
    assert_eq!(options.len() % 4, 0, "TCP options must fill whole words");
    let header_words = ((20 + options.len()) / 4) as u16;
    let mut segment = vec![0u8; 20];
    TcpHeader {
        src_port,
        dst_port,
        seq_number: seq,
        ack_number: ack,
        data_offset_and_flags: (header_words << 12) | flags,
        window_size: 29200,
        checksum: 0,
        urgent_ptr: 0,
    }
    .write_to(&mut segment);
    segment.extend_from_slice(options);
    segment.extend_from_slice(data);
    let sum = pseudo_header_checksum(PEER_IP, LOCAL_IP, protocol::TCP, &segment);
    segment[16..18].copy_from_slice(&sum.to_be_bytes());
    ipv4_frame(protocol::TCP, PEER_IP, LOCAL_IP, &segment)
}

/// Overwrite the IPv4 total length of a built frame, leaving the checksum
/// stale.
pub fn set_ip_total_len(frame: &mut [u8], total_len: u16) {
    frame[16..18].copy_from_slice(&total_len.to_be_bytes());
}

/// Split a sent IPv4 frame into its IP header and IP payload.
pub fn parse_ipv4(frame: &[u8]) -> (Ipv4Header, &[u8]) {
    let header = Ipv4Header::from_bytes(&frame[14..]).expect("ipv4 header");
    let end = 14 + header.total_len as usize;
    (header, &frame[34..end])
}
