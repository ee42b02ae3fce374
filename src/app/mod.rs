//! Application-facing pieces
//!
//! - DNS query encoding and answer location
//! - Registry of per-port payload handlers

pub mod dns;
pub mod handler;

pub use dns::{DnsAnswer, DnsHeader, Labels};
pub use handler::{Exchange, HandlerRegistry, TcpRoute};
