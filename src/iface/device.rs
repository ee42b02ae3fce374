//! Raw frame devices
//!
//! The stack talks to the MAC/PHY through [`NetDevice`]: whole Ethernet
//! frames in, whole frames out, never blocking on receive.

use std::collections::VecDeque;
use std::io;

pub trait NetDevice {
    /// Copy one pending frame into `buf` and return its length, or 0 when
    /// nothing is pending. Must not block.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Transmit one complete Ethernet frame.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl<D: NetDevice + ?Sized> NetDevice for &mut D {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).receive(buf)
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send(frame)
    }
}

/// Produces the frames a peer would answer with when it sees a sent frame.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>>>;

/// In-memory frame queues, optionally with a scripted peer.
///
/// Frames pushed with [`MemoryDevice::push_frame`] are handed out by
/// `receive` in order. Every sent frame is recorded, and if a responder is
/// set its answers are queued for receiving.
#[derive(Default)]
pub struct MemoryDevice {
    rx: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    responder: Option<Responder>,
    receive_calls: usize,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder(responder: impl FnMut(&[u8]) -> Vec<Vec<u8>> + 'static) -> Self {
        MemoryDevice {
            responder: Some(Box::new(responder)),
            ..Default::default()
        }
    }

    pub fn push_frame(&mut self, frame: impl Into<Vec<u8>>) {
        self.rx.push_back(frame.into());
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Number of `receive` calls, including those that found nothing.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls
    }
}

impl NetDevice for MemoryDevice {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.receive_calls += 1;
        match self.rx.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok(len)
            }
            None => Ok(0),
        }
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.sent.push(frame.to_vec());
        if let Some(responder) = self.responder.as_mut() {
            self.rx.extend(responder(frame));
        }
        Ok(())
    }
}

#[cfg(feature = "tap")]
pub use tap::TapDevice;

#[cfg(feature = "tap")]
mod tap {
    use super::NetDevice;
    use std::io;
    use tun_tap::{Iface, Mode};

    /// Linux TAP interface carrying raw Ethernet frames.
    pub struct TapDevice {
        iface: Iface,
    }

    impl TapDevice {
        /// Open (or create) the TAP device `name` in non-blocking mode.
        pub fn open(name: &str) -> io::Result<Self> {
            let iface = Iface::without_packet_info(name, Mode::Tap)?;
            iface.set_non_blocking()?;
            Ok(TapDevice { iface })
        }

        pub fn name(&self) -> &str {
            self.iface.name()
        }
    }

    impl NetDevice for TapDevice {
        fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.iface.recv(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(e),
            }
        }

        fn send(&mut self, frame: &[u8]) -> io::Result<()> {
            self.iface.send(frame).map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_device_queues() {
        let mut device = MemoryDevice::new();
        device.push_frame(vec![1, 2, 3]);
        device.push_frame(vec![4; 10]);

        let mut buf = [0u8; 4];
        assert_eq!(device.receive(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        // truncated to the buffer
        assert_eq!(device.receive(&mut buf).unwrap(), 4);
        assert_eq!(device.receive(&mut buf).unwrap(), 0);
        assert_eq!(device.receive_calls(), 3);
    }

    #[test]
    fn test_memory_device_responder() {
        let mut device = MemoryDevice::with_responder(|frame| vec![frame.iter().rev().copied().collect()]);
        device.send(&[1, 2, 3]).unwrap();
        assert_eq!(device.sent(), &[vec![1u8, 2, 3]]);
        assert_eq!(device.pending(), 1);

        let mut buf = [0u8; 8];
        let n = device.receive(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[3, 2, 1]);
        assert_eq!(device.take_sent().len(), 1);
        assert!(device.sent().is_empty());
    }
}
