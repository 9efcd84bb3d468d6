//! Host identity used by `#@if` conditions.
//!
//! `%{LOCAL_HOST}` compares against [`HostIdentity::hostname`] and
//! `%{LOCAL_IP}` against every address in [`HostIdentity::local_ips`].

use std::net::IpAddr;

/// Source of the running machine's name and bound addresses.
pub trait HostIdentity: Send + Sync + std::fmt::Debug {
    /// The machine's hostname, or `None` when it cannot be determined.
    fn hostname(&self) -> Option<String>;

    /// Every local, non-loopback address.
    fn local_ips(&self) -> Vec<IpAddr>;
}

/// Queries the operating system on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn hostname(&self) -> Option<String> {
        ["/proc/sys/kernel/hostname", "/etc/hostname"]
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .chain(["HOSTNAME", "COMPUTERNAME"].iter().filter_map(|v| std::env::var(v).ok()))
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
    }

    fn local_ips(&self) -> Vec<IpAddr> {
        let interfaces = match if_addrs::get_if_addrs() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate network interfaces");
                return Vec::new();
            }
        };

        let mut ips: Vec<IpAddr> = Vec::with_capacity(interfaces.len());
        for ip in interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip())
        {
            // An address can be bound to several interfaces.
            if !ips.contains(&ip) {
                ips.push(ip);
            }
        }
        ips
    }
}

/// Fixed identity, for tests and for callers that pin the host explicitly.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    hostname: Option<String>,
    ips: Vec<IpAddr>,
}

impl StaticHost {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            ips: Vec::new(),
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ips.push(ip);
        self
    }
}

impl HostIdentity for StaticHost {
    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn local_ips(&self) -> Vec<IpAddr> {
        self.ips.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_host_reports_configured_identity() {
        let host = StaticHost::new("node-1")
            .with_ip("10.0.0.7".parse().unwrap())
            .with_ip("fe80::1".parse().unwrap());

        assert_eq!(host.hostname().as_deref(), Some("node-1"));
        assert_eq!(host.local_ips().len(), 2);
    }

    #[test]
    fn test_system_host_never_reports_loopback() {
        let ips = SystemHost.local_ips();
        assert!(ips.iter().all(|ip| !ip.is_loopback()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_host_reports_every_interface_address() {
        let reported = SystemHost.local_ips();
        let bound: Vec<IpAddr> = if_addrs::get_if_addrs()
            .unwrap()
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.ip())
            .collect();

        for ip in &bound {
            assert!(reported.contains(ip), "{ip} is bound but not reported");
        }
        assert!(reported.iter().all(|ip| bound.contains(ip)));
    }
}
