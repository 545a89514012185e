// # IP Source Trait
//
// Defines the interface for detecting the host's IP address.
//
// ## Implementations
//
// - Interface address (Linux, rtnetlink): `gandi-ddns-ip-netlink` crate
// - Public echo service over HTTP: `gandi-ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use gandi_ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("{} says {}", source.source_name(), current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Trait for IP source implementations
///
/// A source answers one question: what is the address right now? It is
/// queried exactly once per run.
///
/// ## Allowed Capabilities
/// - Perform platform-specific I/O (Netlink, sockets) or a single HTTP request
///
/// ## Forbidden Capabilities
/// - Retry or poll (a failed lookup is reported to the caller as-is)
/// - Cache an address across calls
/// - Decide what to do with the address
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Short name for logs (e.g. "netlink", "http")
    fn source_name(&self) -> &'static str;

    /// Get the IP version this source reports
    ///
    /// Returns `None` if the implementation may return either.
    fn version(&self) -> Option<IpVersion> {
        None
    }
}
