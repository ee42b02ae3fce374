use log::info;
use std::io;
use std::process::Command;

fn run_ip(args: &[&str]) -> io::Result<()> {
    let status = Command::new("ip").args(args).status()?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("`ip {}` exited with {}", args.join(" "), status),
        ));
    }
    Ok(())
}

/// Give the host side of the TAP device an address and bring it up.
pub fn configure_interface(iface_name: &str, ip_cidr: &str) -> io::Result<()> {
    run_ip(&["addr", "add", ip_cidr, "dev", iface_name])?;
    run_ip(&["link", "set", "up", "dev", iface_name])?;
    info!("interface {} configured with {} and brought up", iface_name, ip_cidr);
    Ok(())
}

pub fn parse_ipv4(text: &str) -> Option<[u8; 4]> {
    let addr: std::net::Ipv4Addr = text.parse().ok()?;
    Some(addr.octets())
}

pub fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split(':');
    for octet in mac.iter_mut() {
        *octet = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    parts.next().is_none().then_some(mac)
}
