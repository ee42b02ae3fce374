//! A minimal TCP/IP stack for a single-host embedded device
//!
//! Every received frame lands in one shared buffer and every reply is
//! built by rewriting that buffer in place. The stack provides:
//! - Ethernet dispatch and ARP request/reply
//! - IPv4 with ICMP echo answering and ping
//! - UDP exchange and a stateless TCP responder
//! - A DNS A-record resolver
//!
//! Applications register per-port handlers on the [`NetworkInterface`]
//! and drive it with [`NetworkInterface::poll`].

pub mod app;
pub mod config;
pub mod error;
pub mod iface;
pub mod link;
pub mod network;
pub mod transport;

// Re-export commonly used types
pub use app::dns::DnsAnswer;
pub use app::handler::{Exchange, HandlerRegistry, TcpRoute};
pub use config::StackConfig;
pub use error::{NetError, Result};
pub use iface::{MemoryDevice, NetDevice, NetworkInterface, PollBudget};
#[cfg(feature = "tap")]
pub use iface::TapDevice;
pub use link::ethernet::MacAddr;
pub use network::icmp::{IcmpHeader, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
pub use network::ipv4::Ipv4Header;
