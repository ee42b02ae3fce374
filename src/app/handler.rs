//! Port handler registry
//!
//! Application code receives TCP and UDP payloads through handlers keyed by
//! local port, with one default handler per protocol for everything else.
//! A handler sees the payload where it sits in the frame buffer and may
//! write its reply over it.

use crate::error::{NetError, Result};
use std::collections::HashMap;
use std::fmt;

/// A registered payload handler.
pub type Handler = Box<dyn FnMut(&mut Exchange<'_>)>;

/// A received payload and the room to answer it, both inside the frame
/// buffer.
pub struct Exchange<'a> {
    region: &'a mut [u8],
    len: usize,
    reply: Option<usize>,
    remote_ip: [u8; 4],
    remote_port: u16,
    local_port: u16,
}

impl<'a> Exchange<'a> {
    pub(crate) fn new(
        region: &'a mut [u8],
        len: usize,
        remote_ip: [u8; 4],
        remote_port: u16,
        local_port: u16,
    ) -> Self {
        let len = len.min(region.len());
        Exchange {
            region,
            len,
            reply: None,
            remote_ip,
            remote_port,
            local_port,
        }
    }

    /// The payload as received.
    pub fn request(&self) -> &[u8] {
        &self.region[..self.len]
    }

    pub fn remote_ip(&self) -> [u8; 4] {
        self.remote_ip
    }

    pub fn remote_port(&self) -> u16 {
        self.remote_port
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Bytes available for a reply, keeping room for one pad byte.
    pub fn capacity(&self) -> usize {
        self.region.len().saturating_sub(1)
    }

    /// Answer with `bytes`, written over the request.
    pub fn reply(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_capacity(bytes.len())?;
        self.region[..bytes.len()].copy_from_slice(bytes);
        self.reply = Some(bytes.len());
        Ok(())
    }

    /// Answer with the first `len` bytes already in the payload region,
    /// e.g. after editing the request with [`Exchange::payload_mut`].
    pub fn reply_in_place(&mut self, len: usize) -> Result<()> {
        self.check_capacity(len)?;
        self.reply = Some(len);
        Ok(())
    }

    /// The whole writable payload region, starting with the request.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let capacity = self.capacity();
        &mut self.region[..capacity]
    }

    pub(crate) fn reply_len(&self) -> Option<usize> {
        self.reply
    }

    fn check_capacity(&self, len: usize) -> Result<()> {
        if len > self.capacity() {
            return Err(NetError::PayloadTooLarge {
                len,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

/// How acknowledgments advance when replying on a TCP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpRoute {
    /// Line-oriented traffic, treated as framed: sending does not advance
    /// the acknowledgment number.
    Line,
    /// HTTP-like request/response traffic.
    Http,
    /// Any other byte stream.
    Stream,
}

impl TcpRoute {
    pub fn is_framed(&self) -> bool {
        matches!(self, TcpRoute::Line)
    }
}

struct TcpEntry {
    route: TcpRoute,
    handler: Handler,
}

#[derive(Default)]
pub struct HandlerRegistry {
    tcp: HashMap<u16, TcpEntry>,
    default_tcp: Option<Handler>,
    udp: HashMap<u16, Handler>,
    default_udp: Option<Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a line-oriented protocol (telnet-style) on `port`.
    pub fn register_line(&mut self, port: u16, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.insert_tcp(port, TcpRoute::Line, Box::new(handler));
    }

    /// Route an HTTP-like protocol on `port`.
    pub fn register_http(&mut self, port: u16, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.insert_tcp(port, TcpRoute::Http, Box::new(handler));
    }

    pub fn register_tcp(&mut self, port: u16, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.insert_tcp(port, TcpRoute::Stream, Box::new(handler));
    }

    /// Handler for TCP data on ports with no route of their own.
    pub fn set_default_tcp(&mut self, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.default_tcp = Some(Box::new(handler));
    }

    pub fn register_udp(&mut self, port: u16, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.udp.insert(port, Box::new(handler));
    }

    /// Handler for UDP datagrams on ports with no route of their own.
    pub fn set_default_udp(&mut self, handler: impl FnMut(&mut Exchange<'_>) + 'static) {
        self.default_udp = Some(Box::new(handler));
    }

    /// Route registered for `port`, `None` when it falls to the default.
    pub fn tcp_route(&self, port: u16) -> Option<TcpRoute> {
        self.tcp.get(&port).map(|entry| entry.route)
    }

    pub(crate) fn tcp_handler(&mut self, port: u16) -> Option<&mut Handler> {
        match self.tcp.get_mut(&port) {
            Some(entry) => Some(&mut entry.handler),
            None => self.default_tcp.as_mut(),
        }
    }

    pub(crate) fn udp_handler(&mut self, port: u16) -> Option<&mut Handler> {
        match self.udp.get_mut(&port) {
            Some(handler) => Some(handler),
            None => self.default_udp.as_mut(),
        }
    }

    fn insert_tcp(&mut self, port: u16, route: TcpRoute, handler: Handler) {
        self.tcp.insert(port, TcpEntry { route, handler });
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tcp: Vec<_> = self.tcp.iter().map(|(port, e)| (*port, e.route)).collect();
        tcp.sort_unstable_by_key(|(port, _)| *port);
        let mut udp: Vec<_> = self.udp.keys().copied().collect();
        udp.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("tcp", &tcp)
            .field("default_tcp", &self.default_tcp.is_some())
            .field("udp", &udp)
            .field("default_udp", &self.default_udp.is_some())
            .finish()
    }
}
