//! Local/public IP detection
//!
//! The local interface address is what gets published. The public address is
//! only used to detect NAT or misrouting: a mismatch is reported, never
//! substituted.

use crate::error::Result;
use crate::traits::IpSource;
use std::net::IpAddr;
use tracing::{debug, warn};

/// What the two sources reported for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpObservation {
    /// Address bound to the WAN interface
    pub local: IpAddr,
    /// Address seen by the public echo service
    pub public: IpAddr,
    /// `local != public`
    pub mismatch: bool,
}

impl IpObservation {
    /// Build an observation, computing the mismatch flag
    pub fn new(local: IpAddr, public: IpAddr) -> Self {
        Self {
            local,
            public,
            mismatch: local != public,
        }
    }

    /// Notification text for a mismatch
    pub fn mismatch_message(&self) -> String {
        format!("IP mismatch: {} vs. {}", self.local, self.public)
    }
}

/// Queries the interface and the public echo service once each
pub struct IpResolver {
    local: Box<dyn IpSource>,
    public: Box<dyn IpSource>,
}

impl IpResolver {
    /// Create a resolver from the two sources
    pub fn new(local: Box<dyn IpSource>, public: Box<dyn IpSource>) -> Self {
        Self { local, public }
    }

    /// Detect both addresses
    ///
    /// Either lookup failing is fatal for the run; there is no fallback to
    /// one source only.
    pub async fn resolve(&self) -> Result<IpObservation> {
        let local = self.local.current().await?;
        debug!("{} reports local IP {}", self.local.source_name(), local);

        let public = self.public.current().await?;
        debug!("{} reports public IP {}", self.public.source_name(), public);

        let observation = IpObservation::new(local, public);
        if observation.mismatch {
            warn!("{}", observation.mismatch_message());
        }

        Ok(observation)
    }
}
