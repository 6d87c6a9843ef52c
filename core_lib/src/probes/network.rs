//! DNS, TCP and HTTP reachability probes

use super::{ProbeFailure, ProbeResult};
use crate::error::Result;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

pub const ETCD_PORT: u16 = 2379;
pub const REGISTRY_PORT: u16 = 5000;
pub const ROUTER_STATS_PORT: u16 = 1936;

pub fn resolve(host: &str) -> ProbeResult {
    let addrs: Vec<SocketAddr> = (host, 0)
        .to_socket_addrs()
        .map_err(|e| ProbeFailure::new(format!("DNS lookup of {} failed: {}", host, e)))?
        .collect();

    if addrs.is_empty() {
        return Err(ProbeFailure::new(format!(
            "DNS lookup of {} returned no addresses",
            host
        )));
    }

    debug!("{} resolved to {:?}", host, addrs);
    Ok(())
}

/// Every cluster member must accept a TCP connection on its client port.
pub fn etcd_health(addresses: &[String], timeout: Duration) -> ProbeResult {
    let unreachable: Vec<String> = addresses
        .iter()
        .filter_map(|address| {
            let target = with_default_port(address, ETCD_PORT);
            match connect(&target, timeout) {
                Ok(()) => None,
                Err(reason) => Some(format!("{} ({})", target, reason)),
            }
        })
        .collect();

    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(format!(
            "Etcd members not reachable: {}",
            unreachable.join(", ")
        )))
    }
}

fn connect(target: &str, timeout: Duration) -> std::result::Result<(), String> {
    let addrs: Vec<SocketAddr> = target
        .to_socket_addrs()
        .map_err(|e| e.to_string())?
        .collect();

    let mut last_error = "no address".to_string();
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(last_error)
}

/// Appends `port` unless `address` already names one.
pub fn with_default_port(address: &str, port: u16) -> String {
    let address = address.trim();
    match address.matches(':').count() {
        0 => format!("{}:{}", address, port),
        1 => address.to_string(),
        _ if address.starts_with('[') => {
            if address.contains("]:") {
                address.to_string()
            } else {
                format!("{}:{}", address, port)
            }
        }
        _ => format!("[{}]:{}", address, port),
    }
}

/// Blocking HTTP client shared by the health endpoint probes.
pub struct HttpProber {
    client: reqwest::blocking::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        // Cluster endpoints use self-signed certificates.
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { client })
    }

    pub fn expect_success(&self, what: &str, url: &str) -> ProbeResult {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProbeFailure::new(format!("{} {} not reachable: {}", what, url, e)))?;

        let status = response.status();
        if status.is_success() {
            debug!("{} {} answered {}", what, url, status);
            Ok(())
        } else {
            Err(ProbeFailure::new(format!(
                "{} {} returned {}",
                what, url, status
            )))
        }
    }

    pub fn registry_health(&self, address: &str) -> ProbeResult {
        let url = format!("http://{}/healthz", with_default_port(address, REGISTRY_PORT));
        self.expect_success("Registry", &url)
    }

    pub fn router_health(&self, address: &str) -> ProbeResult {
        let url = format!("http://{}/healthz", with_default_port(address, ROUTER_STATS_PORT));
        self.expect_success("Router", &url)
    }

    pub fn hawkular_health(&self, address: &str) -> ProbeResult {
        let url = format!("https://{}/hawkular/metrics/status", address.trim());
        self.expect_success("Hawkular metrics", &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_with_default_port() {
        assert_eq!(with_default_port("10.0.0.1", 2379), "10.0.0.1:2379");
        assert_eq!(with_default_port(" 10.0.0.1:4001 ", 2379), "10.0.0.1:4001");
        assert_eq!(with_default_port("etcd.local", 2379), "etcd.local:2379");
        assert_eq!(with_default_port("etcd.local:4001", 2379), "etcd.local:4001");
        assert_eq!(with_default_port("fd00::1", 2379), "[fd00::1]:2379");
        assert_eq!(with_default_port("[fd00::1]:4001", 2379), "[fd00::1]:4001");
    }

    #[test]
    fn test_resolve_localhost() {
        assert!(resolve("localhost").is_ok());
    }

    #[test]
    fn test_etcd_health_reachable_member() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        assert!(etcd_health(&[address], Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_etcd_health_unreachable_member() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = etcd_health(&[address.clone()], Duration::from_millis(200)).unwrap_err();
        assert!(err.message().starts_with("Etcd members not reachable: "));
        assert!(err.message().contains(&address));
    }

    #[test]
    fn test_http_failure_names_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let prober = HttpProber::new(Duration::from_millis(500)).unwrap();
        let err = prober.router_health(&address).unwrap_err();
        assert!(err
            .message()
            .starts_with(&format!("Router http://{}/healthz not reachable", address)));
    }
}
