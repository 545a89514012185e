//! Core traits for gandi-ddns
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Detect an IP address (interface or public)
//! - [`ZoneProvider`]: Read and write RRsets via the provider API
//! - [`Notifier`]: Best-effort event delivery

pub mod ip_source;
pub mod notifier;
pub mod zone_provider;

pub use ip_source::{IpSource, IpVersion};
pub use notifier::Notifier;
pub use zone_provider::{DomainInfo, LiveRecord, PutOutcome, RecordSet, ZoneProvider};
