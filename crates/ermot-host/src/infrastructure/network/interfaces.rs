//! ConnectionInfoResolver: the address controllers should dial.
//!
//! Interfaces are listed with `local-ip-address` on every call, so an
//! address change (new Wi-Fi network, cable plugged in) shows up in the next
//! pairing without a restart.  The choice between interfaces is made by
//! [`select_local_ip`].

use tracing::{debug, warn};

use ermot_core::domain::connection::{select_local_ip, ConnectionInfo, NetworkInterface};

use crate::application::pairing::ConnectionInfoSource;

/// Lists the host's IPv4 interfaces.
pub type InterfaceLister = fn() -> Vec<NetworkInterface>;

/// IPv4 interfaces as reported by the OS, in OS enumeration order.
pub fn system_interfaces() -> Vec<NetworkInterface> {
    match local_ip_address::list_afinet_netifas() {
        Ok(list) => list
            .into_iter()
            .map(|(name, addr)| NetworkInterface::new(name, addr))
            .collect(),
        Err(e) => {
            warn!("Could not list network interfaces: {e}");
            Vec::new()
        }
    }
}

/// The machine's host name, or `"unknown"`.
pub fn system_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct ConnectionInfoResolver {
    port: u16,
    hostname: String,
    lister: InterfaceLister,
}

impl ConnectionInfoResolver {
    /// Resolver for the command channel listening on `port`.
    pub fn new(port: u16) -> Self {
        Self::with_lister(port, system_hostname(), system_interfaces)
    }

    pub fn with_lister(port: u16, hostname: impl Into<String>, lister: InterfaceLister) -> Self {
        Self {
            port,
            hostname: hostname.into(),
            lister,
        }
    }

    /// The LAN address to advertise, or `"localhost"`.
    pub fn local_ip(&self) -> String {
        let interfaces = (self.lister)();
        let ip = select_local_ip(&interfaces);
        debug!(
            "Selected {ip} from {} interface address(es)",
            interfaces.len()
        );
        ip
    }
}

impl ConnectionInfoSource for ConnectionInfoResolver {
    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::new(self.local_ip(), self.port, self.hostname.clone())
    }
}
