//! Remote address handling
//!
//! Splits `host:port` strings for TLS server names and resolves them to a
//! socket address.

use anyhow::{Context, Result};
use std::net::SocketAddr;

/// A `host:port` address as given by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr {
    /// The original address string
    addr: String,
    /// Host part without brackets
    host: String,
    /// Port number
    port: u16,
}

impl RemoteAddr {
    /// Parse an address of the form `host:port` or `[v6]:port`
    pub fn parse(addr: &str) -> Result<Self> {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("Missing port in address: {}", addr))?;

        let port: u16 = port
            .parse()
            .with_context(|| format!("Invalid port in address: {}", addr))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            anyhow::bail!("Missing host in address: {}", addr);
        }

        Ok(RemoteAddr {
            addr: addr.to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// Get the original address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get the host part, suitable as a TLS server name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to the first socket address of the requested family
    ///
    /// Falls back to the first address of any family when none matches.
    pub async fn resolve(&self, prefer_ipv6: bool) -> Result<SocketAddr> {
        let resolved: Vec<SocketAddr> = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("Failed to resolve address: {}", self.addr))?
            .collect();

        resolved
            .iter()
            .find(|a| a.is_ipv6() == prefer_ipv6)
            .or_else(|| resolved.first())
            .copied()
            .with_context(|| format!("No addresses found for: {}", self.addr))
    }
}
