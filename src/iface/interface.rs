//! Network interface and frame dispatch
//!
//! [`NetworkInterface`] owns the device, the configuration and the single
//! frame buffer every layer works in. Replies are built by rewriting the
//! request in that buffer: each layer rewrites only the header fields it
//! owns, so every other byte of the request is still there in the reply.
//! Outbound requests use the same path by staging a reply-shaped record
//! (peer as source, this host as destination) that the send path turns
//! around.

use crate::app::handler::HandlerRegistry;
use crate::config::StackConfig;
use crate::error::{NetError, Result};
use crate::iface::budget::PollBudget;
use crate::iface::device::NetDevice;
use crate::link::arp::{ArpPacket, ARP_PACKET_LEN};
use crate::link::ethernet::{ethertype, EthernetHeader, MacAddr, ETH_HEADER_LEN};
use crate::network::ipv4::IPV4_HEADER_LEN;
use log::{debug, trace, warn};

/// Size of the shared frame buffer: a full 1514-byte frame plus room for
/// the terminator written after received payloads.
pub const FRAME_BUFFER_LEN: usize = 1536;
/// Largest frame the stack builds: 1500-byte MTU plus the Ethernet header.
pub const MAX_FRAME_LEN: usize = 1514;

pub(crate) const IP_OFFSET: usize = ETH_HEADER_LEN;
pub(crate) const L4_OFFSET: usize = ETH_HEADER_LEN + IPV4_HEADER_LEN;

/// Network interface for packet processing
pub struct NetworkInterface<D: NetDevice> {
    pub(crate) device: D,
    pub(crate) config: StackConfig,
    pub(crate) frame: [u8; FRAME_BUFFER_LEN],
    pub(crate) handlers: HandlerRegistry,
    pub(crate) ping_sequence: u16,
    pub(crate) dns_transaction: u16,
}

impl<D: NetDevice> NetworkInterface<D> {
    pub fn new(device: D, config: StackConfig) -> Self {
        let dns_transaction = config.dns_transaction_seed;
        NetworkInterface {
            device,
            config,
            frame: [0; FRAME_BUFFER_LEN],
            handlers: HandlerRegistry::new(),
            ping_sequence: 0,
            dns_transaction,
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn local_mac(&self) -> MacAddr {
        self.config.mac
    }

    pub fn local_ip(&self) -> [u8; 4] {
        self.config.ip
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// The shared frame buffer, holding the last frame received or built.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Drain every frame the device has pending, answering each one before
    /// pulling the next. Returns the number of frames processed.
    ///
    /// Device errors end the drain; they are logged, not returned.
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;
        loop {
            match self.device.receive(&mut self.frame) {
                Ok(0) => break,
                Ok(len) => {
                    processed += 1;
                    self.dispatch(len);
                }
                Err(e) => {
                    warn!("receive failed: {}", e);
                    break;
                }
            }
        }
        processed
    }

    /// Route the `len`-byte frame in the buffer by ethertype.
    pub(crate) fn dispatch(&mut self, len: usize) {
        if len <= ETH_HEADER_LEN {
            trace!("dropping runt frame of {} bytes", len);
            return;
        }
        let eth = match EthernetHeader::from_bytes(&self.frame[..len]) {
            Some(eth) => eth,
            None => return,
        };

        match eth.ethertype {
            ethertype::ARP => self.arp_read(len),
            ethertype::IPV4 => self.ip_read(len),
            other => trace!("ignoring ethertype {:#06x}", other),
        }
    }

    fn arp_read(&mut self, len: usize) {
        let arp_end = IP_OFFSET + ARP_PACKET_LEN;
        let mut arp = match ArpPacket::from_bytes(&self.frame[IP_OFFSET..len]) {
            Some(arp) if arp.is_request_for(self.config.ip) => arp,
            _ => {
                trace!("ignoring ARP frame not asking for us");
                return;
            }
        };

        arp.answer(self.config.mac, self.config.ip);
        arp.write_to(&mut self.frame[IP_OFFSET..arp_end]);
        debug!(
            "answering ARP request from {} ({:?})",
            arp.target_hw, arp.target_ip
        );
        if let Err(e) = self.eth_send_reply(arp_end) {
            warn!("ARP reply failed: {}", e);
        }
    }

    /// Address the first `len` bytes of the buffer back to the hardware
    /// address in its source field and transmit them.
    pub(crate) fn eth_send_reply(&mut self, len: usize) -> Result<()> {
        if len > MAX_FRAME_LEN {
            return Err(NetError::PayloadTooLarge {
                len,
                capacity: MAX_FRAME_LEN,
            });
        }
        let mut eth = EthernetHeader::from_bytes(&self.frame).ok_or(NetError::ProtocolMismatch {
            expected: "Ethernet",
        })?;
        eth.turn_around(self.config.mac);
        eth.write_to(&mut self.frame);
        self.device.send(&self.frame[..len])?;
        Ok(())
    }

    /// Poll the device until `matches` accepts a received frame or the
    /// budget is spent. On success returns the match and the 1-based poll
    /// iteration it arrived on.
    ///
    /// Frames that do not match are dropped.
    pub(crate) fn wait_for<T>(
        &mut self,
        budget: PollBudget,
        mut matches: impl FnMut(&[u8]) -> Option<T>,
    ) -> Result<(T, u32)> {
        let mut received_any = false;
        for iteration in 1..=budget.limit() {
            let len = self.device.receive(&mut self.frame)?;
            if len == 0 {
                continue;
            }
            received_any = true;
            if let Some(found) = matches(&self.frame[..len]) {
                return Ok((found, iteration));
            }
            trace!("dropping unmatched frame while waiting");
        }

        let budget = budget.limit();
        if received_any {
            Err(NetError::Timeout { budget })
        } else {
            Err(NetError::NoReply { budget })
        }
    }
}
