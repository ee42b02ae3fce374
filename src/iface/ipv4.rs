use crate::error::{NetError, Result};
use crate::iface::device::NetDevice;
use crate::iface::interface::{NetworkInterface, FRAME_BUFFER_LEN, IP_OFFSET, L4_OFFSET, MAX_FRAME_LEN};
use crate::link::ethernet::{ethertype, EthernetHeader};
use crate::network::icmp::{echo_reply_in_place, ICMP_HEADER_LEN};
use crate::network::ipv4::{Ipv4Header, DEFAULT_TTL, IPV4_HEADER_LEN, IPV4_VERSION_IHL};
use crate::network::protocol;
use log::{debug, trace};

impl<D: NetDevice> NetworkInterface<D> {
    /// Validate the IPv4 packet in a `len`-byte frame and hand it to the
    /// transport layer.
    pub(crate) fn ip_read(&mut self, len: usize) {
        let header = match Ipv4Header::from_bytes(&self.frame[IP_OFFSET..len]) {
            Some(header) => header,
            None => return,
        };
        if !header.is_plain_ipv4() || header.dst_addr != self.config.ip {
            trace!("ignoring IPv4 packet for {:?}", header.dst_addr);
            return;
        }
        if self.config.verify_rx_checksums && !header.checksum_valid() {
            trace!("dropping IPv4 packet with bad header checksum");
            return;
        }

        // the peer's total length bounds everything parsed after this point
        let total = (header.total_len as usize).min(len - IP_OFFSET);
        if total < IPV4_HEADER_LEN {
            return;
        }
        let end = IP_OFFSET + total;
        if end < FRAME_BUFFER_LEN {
            self.frame[end] = 0;
        }

        let payload_len = total - IPV4_HEADER_LEN;
        match header.protocol {
            protocol::ICMP => self.icmp_read(payload_len),
            protocol::TCP => self.tcp_read(&header, payload_len),
            protocol::UDP => self.udp_read(&header, payload_len),
            other => trace!("unsupported protocol: {}", other),
        }
    }

    fn icmp_read(&mut self, payload_len: usize) {
        if payload_len < ICMP_HEADER_LEN {
            return;
        }
        if !echo_reply_in_place(&mut self.frame[L4_OFFSET..L4_OFFSET + payload_len]) {
            trace!("ignoring ICMP type {}", self.frame[L4_OFFSET]);
            return;
        }
        debug!("answering ICMP echo request ({} bytes)", payload_len);
        if let Err(e) = self.ip_send(protocol::ICMP, payload_len) {
            debug!("ICMP echo reply failed: {}", e);
        }
    }

    /// Finish the IPv4 header in the buffer around a `payload_len`-byte
    /// payload and transmit the frame.
    ///
    /// Source and destination are swapped, the identifier already in the
    /// buffer is kept, and the checksum is recomputed.
    pub(crate) fn ip_send(&mut self, protocol: u8, payload_len: usize) -> Result<()> {
        let frame_len = L4_OFFSET + payload_len;
        if frame_len > MAX_FRAME_LEN {
            return Err(NetError::PayloadTooLarge {
                len: payload_len,
                capacity: MAX_FRAME_LEN - L4_OFFSET,
            });
        }

        let mut header = Ipv4Header::from_bytes(&self.frame[IP_OFFSET..]).ok_or(NetError::SizeMismatch {
            len: IPV4_HEADER_LEN,
            limit: FRAME_BUFFER_LEN - IP_OFFSET,
        })?;
        header.version_ihl = IPV4_VERSION_IHL;
        header.tos = 0;
        header.total_len = (IPV4_HEADER_LEN + payload_len) as u16;
        header.flags_frag_offset = 0;
        header.ttl = DEFAULT_TTL;
        header.protocol = protocol;
        header.swap_addrs();
        header.update_checksum();
        header.write_to(&mut self.frame[IP_OFFSET..L4_OFFSET]);

        self.eth_send_reply(frame_len)
    }

    /// Fail unless the buffer holds an IPv4 record of `protocol`.
    pub(crate) fn expect_staged(&self, protocol: u8, name: &'static str) -> Result<Ipv4Header> {
        let mismatch = || NetError::ProtocolMismatch { expected: name };
        let eth = EthernetHeader::from_bytes(&self.frame).ok_or_else(mismatch)?;
        let header = Ipv4Header::from_bytes(&self.frame[IP_OFFSET..]).ok_or_else(mismatch)?;
        if eth.ethertype != ethertype::IPV4 || !header.is_plain_ipv4() || header.protocol != protocol {
            return Err(mismatch());
        }
        Ok(header)
    }
}

/// The IPv4 header and payload of a received frame, if it is plain IPv4.
/// The payload is bounded by the header's total length.
pub(crate) fn ipv4_payload(frame: &[u8]) -> Option<(Ipv4Header, &[u8])> {
    let eth = EthernetHeader::from_bytes(frame)?;
    if eth.ethertype != ethertype::IPV4 {
        return None;
    }
    let header = Ipv4Header::from_bytes(&frame[IP_OFFSET..])?;
    if !header.is_plain_ipv4() {
        return None;
    }
    let end = (IP_OFFSET + header.total_len as usize).min(frame.len());
    if end < L4_OFFSET {
        return None;
    }
    Some((header, &frame[L4_OFFSET..end]))
}
