//! UDP exchange and the reduced TCP responder.
//!
//! Both work on the single datagram or segment staged in the frame buffer:
//! the send paths answer whatever record is there, they are not general
//! socket APIs.

use crate::app::handler::Exchange;
use crate::error::{NetError, Result};
use crate::iface::device::NetDevice;
use crate::iface::interface::{NetworkInterface, FRAME_BUFFER_LEN, L4_OFFSET, MAX_FRAME_LEN};
use crate::network::ipv4::{Ipv4Header, IPV4_HEADER_LEN};
use crate::network::{protocol, pseudo_header_checksum};
use crate::transport::tcp::{flags, TcpHeader, TCP_HEADER_LEN};
use crate::transport::udp::{udp_checksum, UdpHeader, UDP_HEADER_LEN};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace};

pub(crate) const UDP_DATA_OFFSET: usize = L4_OFFSET + UDP_HEADER_LEN;

impl<D: NetDevice> NetworkInterface<D> {
    pub(crate) fn udp_read(&mut self, ip: &Ipv4Header, ip_payload_len: usize) {
        let udp = match UdpHeader::from_bytes(&self.frame[L4_OFFSET..L4_OFFSET + ip_payload_len]) {
            Some(udp) => udp,
            None => return,
        };
        let data_len = udp.payload_len().min(ip_payload_len - UDP_HEADER_LEN);
        let end = UDP_DATA_OFFSET + data_len;
        if end < FRAME_BUFFER_LEN {
            self.frame[end] = 0;
        }

        let NetworkInterface { frame, handlers, .. } = self;
        let handler = match handlers.udp_handler(udp.dst_port) {
            Some(handler) => handler,
            None => {
                trace!("no UDP handler for port {}", udp.dst_port);
                return;
            }
        };
        let mut exchange = Exchange::new(
            &mut frame[UDP_DATA_OFFSET..MAX_FRAME_LEN],
            data_len,
            ip.src_addr,
            udp.src_port,
            udp.dst_port,
        );
        handler(&mut exchange);

        if let Some(reply_len) = exchange.reply_len() {
            if let Err(e) = self.udp_send_in_place(reply_len) {
                debug!("UDP reply failed: {}", e);
            }
        }
    }

    /// Answer the datagram staged in the buffer with `payload`.
    ///
    /// The payload is padded to even length, ports are swapped and the
    /// length field recomputed. The checksum is left zero unless
    /// `udp_tx_checksum` is configured.
    pub fn udp_send(&mut self, payload: &[u8]) -> Result<()> {
        self.expect_staged(protocol::UDP, "UDP")?;
        let capacity = MAX_FRAME_LEN - UDP_DATA_OFFSET - 1;
        if payload.len() > capacity {
            return Err(NetError::PayloadTooLarge {
                len: payload.len(),
                capacity,
            });
        }
        self.frame[UDP_DATA_OFFSET..UDP_DATA_OFFSET + payload.len()].copy_from_slice(payload);
        self.udp_send_in_place(payload.len())
    }

    /// Send the `len` bytes already at the UDP data offset.
    pub(crate) fn udp_send_in_place(&mut self, len: usize) -> Result<()> {
        let len = self.pad_even(UDP_DATA_OFFSET, len);
        let datagram_len = UDP_HEADER_LEN + len;

        let mut udp = UdpHeader::from_bytes(&self.frame[L4_OFFSET..]).ok_or(NetError::ProtocolMismatch {
            expected: "UDP",
        })?;
        udp.swap_ports();
        udp.length = datagram_len as u16;
        udp.checksum = 0;
        udp.write_to(&mut self.frame[L4_OFFSET..UDP_DATA_OFFSET]);

        if self.config.udp_tx_checksum {
            let (src, dst) = self.staged_addrs();
            let sum = udp_checksum(src, dst, &self.frame[L4_OFFSET..L4_OFFSET + datagram_len]);
            BigEndian::write_u16(&mut self.frame[L4_OFFSET + 6..L4_OFFSET + 8], sum);
        }

        self.ip_send(protocol::UDP, datagram_len)
    }

    pub(crate) fn tcp_read(&mut self, ip: &Ipv4Header, ip_payload_len: usize) {
        let mut tcp = match TcpHeader::from_bytes(&self.frame[L4_OFFSET..L4_OFFSET + ip_payload_len]) {
            Some(tcp) => tcp,
            None => return,
        };
        let header_len = tcp.data_offset();
        if header_len < TCP_HEADER_LEN || header_len > ip_payload_len {
            trace!("dropping TCP segment with data offset {}", header_len);
            return;
        }

        tcp.swap_for_reply();

        if !tcp.is_psh() {
            // SYN and FIN each consume one sequence number
            if tcp.flags() != flags::ACK {
                tcp.ack_number = tcp.ack_number.wrapping_add(1);
            }
            if tcp.is_syn() {
                tcp.set_flag(flags::ACK);
            }
            // control replies carry no options
            tcp.data_offset_and_flags = ((TCP_HEADER_LEN as u16 / 4) << 12) | tcp.flags();
            tcp.write_to(&mut self.frame[L4_OFFSET..]);
            debug!(
                "answering TCP control segment on port {} with flags {:#05x}",
                tcp.src_port,
                tcp.flags()
            );
            if let Err(e) = self.tcp_finish(TCP_HEADER_LEN, 0) {
                debug!("TCP control reply failed: {}", e);
            }
            return;
        }

        tcp.write_to(&mut self.frame[L4_OFFSET..]);
        let data_len = ip_payload_len - header_len;
        let data_start = L4_OFFSET + header_len;
        let local_port = tcp.src_port;

        let NetworkInterface { frame, handlers, .. } = self;
        let handler = match handlers.tcp_handler(local_port) {
            Some(handler) => handler,
            None => {
                trace!("no TCP handler for port {}", local_port);
                return;
            }
        };
        let mut exchange = Exchange::new(
            &mut frame[data_start..MAX_FRAME_LEN],
            data_len,
            ip.src_addr,
            tcp.dst_port,
            local_port,
        );
        handler(&mut exchange);

        if let Some(reply_len) = exchange.reply_len() {
            if let Err(e) = self.tcp_send_in_place(reply_len) {
                debug!("TCP reply failed: {}", e);
            }
        }
    }

    /// Answer the segment staged in the buffer with `payload`.
    ///
    /// The reply goes out at the staged header's data offset, padded to even
    /// length. The acknowledgment number advances by `payload.len()` unless
    /// the local port is routed as line-oriented.
    pub fn tcp_send(&mut self, payload: &[u8]) -> Result<()> {
        self.expect_staged(protocol::TCP, "TCP")?;
        let data_start = self.staged_tcp_data_offset()?;
        let capacity = MAX_FRAME_LEN.saturating_sub(data_start + 1);
        if payload.len() > capacity {
            return Err(NetError::PayloadTooLarge {
                len: payload.len(),
                capacity,
            });
        }
        self.frame[data_start..data_start + payload.len()].copy_from_slice(payload);
        self.tcp_send_in_place(payload.len())
    }

    /// Send the `len` bytes already at the staged segment's data offset.
    pub(crate) fn tcp_send_in_place(&mut self, len: usize) -> Result<()> {
        let data_start = self.staged_tcp_data_offset()?;
        let header_len = data_start - L4_OFFSET;
        let padded = self.pad_even(data_start, len);

        let mut tcp = TcpHeader::from_bytes(&self.frame[L4_OFFSET..]).ok_or(NetError::ProtocolMismatch {
            expected: "TCP",
        })?;
        let framed = self
            .handlers
            .tcp_route(tcp.src_port)
            .is_some_and(|route| route.is_framed());
        if !framed {
            tcp.ack_number = tcp.ack_number.wrapping_add(len as u32);
        }
        tcp.write_to(&mut self.frame[L4_OFFSET..]);

        self.tcp_finish(header_len, padded)
    }

    /// Recompute the checksum of the staged segment and send it.
    fn tcp_finish(&mut self, header_len: usize, data_len: usize) -> Result<()> {
        let segment_len = header_len + data_len;
        if L4_OFFSET + segment_len > MAX_FRAME_LEN {
            return Err(NetError::PayloadTooLarge {
                len: segment_len,
                capacity: MAX_FRAME_LEN - L4_OFFSET,
            });
        }
        let (src, dst) = self.staged_addrs();
        BigEndian::write_u16(&mut self.frame[L4_OFFSET + 16..L4_OFFSET + 18], 0);
        let sum = pseudo_header_checksum(src, dst, protocol::TCP, &self.frame[L4_OFFSET..L4_OFFSET + segment_len]);
        BigEndian::write_u16(&mut self.frame[L4_OFFSET + 16..L4_OFFSET + 18], sum);

        self.ip_send(protocol::TCP, segment_len)
    }

    fn staged_tcp_data_offset(&self) -> Result<usize> {
        let tcp = TcpHeader::from_bytes(&self.frame[L4_OFFSET..]).ok_or(NetError::ProtocolMismatch {
            expected: "TCP",
        })?;
        let header_len = tcp.data_offset();
        if header_len < TCP_HEADER_LEN {
            return Err(NetError::SizeMismatch {
                len: header_len,
                limit: TCP_HEADER_LEN,
            });
        }
        Ok(L4_OFFSET + header_len)
    }

    /// Source and destination of the IPv4 header in the buffer. The pseudo
    /// header sum does not depend on their order.
    fn staged_addrs(&self) -> ([u8; 4], [u8; 4]) {
        let ip = &self.frame[L4_OFFSET - IPV4_HEADER_LEN..L4_OFFSET];
        let mut src = [0u8; 4];
        let mut dst = [0u8; 4];
        src.copy_from_slice(&ip[12..16]);
        dst.copy_from_slice(&ip[16..20]);
        (src, dst)
    }

    /// Null-pad an odd-length payload at `start`, returning the new length.
    fn pad_even(&mut self, start: usize, len: usize) -> usize {
        if len % 2 == 0 {
            return len;
        }
        self.frame[start + len] = 0;
        len + 1
    }
}
