//! Network interface layer
//!
//! This module ties the protocol codecs to a device:
//! - Frame devices (TAP and in-memory)
//! - Frame dispatch and in-place replies
//! - UDP and TCP exchanges with registered handlers
//! - Blocking ARP, ping and DNS resolution

pub mod budget;
pub mod device;
pub mod interface;
mod ipv4;
mod resolve;
mod transport;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use budget::PollBudget;
#[cfg(feature = "tap")]
pub use device::TapDevice;
pub use device::{MemoryDevice, NetDevice};
pub use interface::{NetworkInterface, FRAME_BUFFER_LEN, MAX_FRAME_LEN};
