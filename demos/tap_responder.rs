//! TAP responder demo
//!
//! Runs the stack on a TAP device and answers on it as its own host:
//! - ARP and ping for the configured address
//! - a line echo on TCP port 23
//! - a fixed page on TCP port 80
//! - UDP echo on every port
//!
//! To run this demo:
//!
//! ```sh
//! cargo run --example tap_responder -- tap0 10.0.0.1 02:00:00:00:00:01 10.0.0.254/24
//! ```
//!
//! The last argument is the host side address of the TAP device. It
//! defaults to `.254/24` in the stack's own /24.
//!
//! Then from the host: `ping 10.0.0.1`, `nc 10.0.0.1 23`,
//! `curl http://10.0.0.1/` or `nc -u 10.0.0.1 7`.
//!
//! Note: Root/sudo privileges are required to create and configure the TAP device.

use std::thread;
use std::time::Duration;

use log::{info, warn};
use toy_netstack::{MacAddr, NetworkInterface, StackConfig, TapDevice};

mod utils;
use utils::network::{configure_interface, parse_ipv4, parse_mac};

const HTTP_RESPONSE: &[u8] = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nhello from toy-netstack\r\n";

/// Host address in the stack's /24, avoiding the stack's own address.
fn host_cidr_for(ip: [u8; 4]) -> String {
    let host = if ip[3] == 254 { 253 } else { 254 };
    format!("{}.{}.{}.{}/24", ip[0], ip[1], ip[2], host)
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "tap0".to_string());
    let ip = args.next().as_deref().and_then(parse_ipv4).unwrap_or([10, 0, 0, 1]);
    let mac = args
        .next()
        .as_deref()
        .and_then(parse_mac)
        .unwrap_or([0x02, 0, 0, 0, 0, 0x01]);
    let host_cidr = args.next().unwrap_or_else(|| host_cidr_for(ip));

    let device = TapDevice::open(&name)?;
    configure_interface(device.name(), &host_cidr)?;

    let mut stack = NetworkInterface::new(device, StackConfig::new(MacAddr(mac), ip));
    info!("stack up on {} as {:?} ({})", name, ip, stack.local_mac());

    let handlers = stack.handlers_mut();
    handlers.register_line(23, |exchange| {
        let line = exchange.request().to_vec();
        if let Err(e) = exchange.reply(&line) {
            warn!("echo reply dropped: {}", e);
        }
    });
    handlers.register_http(80, |exchange| {
        if let Err(e) = exchange.reply(HTTP_RESPONSE) {
            warn!("http reply dropped: {}", e);
        }
    });
    handlers.set_default_udp(|exchange| {
        let datagram = exchange.request().to_vec();
        if let Err(e) = exchange.reply(&datagram) {
            warn!("udp echo dropped: {}", e);
        }
    });

    loop {
        if stack.poll() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
