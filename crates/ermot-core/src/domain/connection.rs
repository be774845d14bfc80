//! Choosing the address a controller should use to reach the host.
//!
//! The host usually has several interfaces (loopback, Wi-Fi, Ethernet, VPN
//! tunnels, container bridges).  A phone on the same LAN can only reach one
//! of them, so the selection prefers the interface names that are almost
//! always the physical LAN adapter on each OS.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Interface names tried first, in order.
pub const PREFERRED_INTERFACES: [&str; 5] = ["Wi-Fi", "Ethernet", "wlan0", "eth0", "en0"];

/// Returned when no usable IPv4 address exists.
pub const LOCALHOST: &str = "localhost";

/// One address bound to one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub addr: IpAddr,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>, addr: IpAddr) -> Self {
        Self {
            name: name.into(),
            addr,
        }
    }

    /// IPv4 and not loopback.
    fn is_external_ipv4(&self) -> bool {
        self.addr.is_ipv4() && !self.addr.is_loopback()
    }
}

/// Everything a controller needs to dial the command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip: String,
    pub port: u16,
    pub url: String,
    pub hostname: String,
}

impl ConnectionInfo {
    /// Builds the info for `ip:port`; `url` is always `http://ip:port`.
    pub fn new(ip: impl Into<String>, port: u16, hostname: impl Into<String>) -> Self {
        let ip = ip.into();
        let url = format!("http://{ip}:{port}");
        Self {
            ip,
            port,
            url,
            hostname: hostname.into(),
        }
    }
}

/// Picks the address to advertise from an interface listing.
///
/// Preferred names are tried in [`PREFERRED_INTERFACES`] order, then every
/// interface in enumeration order, then [`LOCALHOST`].
pub fn select_local_ip(interfaces: &[NetworkInterface]) -> String {
    let preferred = PREFERRED_INTERFACES.iter().find_map(|wanted| {
        interfaces
            .iter()
            .find(|iface| iface.name == *wanted && iface.is_external_ipv4())
    });

    preferred
        .or_else(|| interfaces.iter().find(|iface| iface.is_external_ipv4()))
        .map(|iface| iface.addr.to_string())
        .unwrap_or_else(|| LOCALHOST.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn v4(name: &str, a: u8, b: u8, c: u8, d: u8) -> NetworkInterface {
        NetworkInterface::new(name, IpAddr::V4(Ipv4Addr::new(a, b, c, d)))
    }

    #[test]
    fn test_empty_interface_list_falls_back_to_localhost() {
        assert_eq!(select_local_ip(&[]), "localhost");
    }

    #[test]
    fn test_only_loopback_and_ipv6_falls_back_to_localhost() {
        let interfaces = vec![
            v4("lo", 127, 0, 0, 1),
            NetworkInterface::new("eth0", IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1))),
        ];
        assert_eq!(select_local_ip(&interfaces), "localhost");
    }

    #[test]
    fn test_preferred_interface_beats_enumeration_order() {
        // Arrange: a docker bridge is enumerated before wlan0
        let interfaces = vec![
            v4("lo", 127, 0, 0, 1),
            v4("docker0", 172, 17, 0, 1),
            v4("wlan0", 192, 168, 1, 42),
        ];

        // Act / Assert
        assert_eq!(select_local_ip(&interfaces), "192.168.1.42");
    }

    #[test]
    fn test_preference_order_is_respected() {
        // wlan0 precedes eth0 in the preference list even when enumerated later
        let interfaces = vec![v4("eth0", 10, 0, 0, 5), v4("wlan0", 10, 0, 0, 6)];
        assert_eq!(select_local_ip(&interfaces), "10.0.0.6");
    }

    #[test]
    fn test_falls_back_to_first_non_internal_ipv4() {
        let interfaces = vec![
            v4("lo", 127, 0, 0, 1),
            v4("enp3s0", 192, 168, 0, 7),
            v4("tun0", 10, 8, 0, 2),
        ];
        assert_eq!(select_local_ip(&interfaces), "192.168.0.7");
    }

    #[test]
    fn test_preferred_interface_with_only_ipv6_is_skipped() {
        let interfaces = vec![
            NetworkInterface::new("en0", IpAddr::V6(Ipv6Addr::LOCALHOST)),
            v4("en1", 192, 168, 2, 3),
        ];
        assert_eq!(select_local_ip(&interfaces), "192.168.2.3");
    }

    #[test]
    fn test_connection_info_url_uses_http_scheme() {
        let info = ConnectionInfo::new("192.168.1.42", 9000, "desk");
        assert_eq!(info.url, "http://192.168.1.42:9000");
        assert_eq!(info.port, 9000);
        assert_eq!(info.hostname, "desk");
    }
}
