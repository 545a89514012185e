// # Zone Provider Trait
//
// Defines the interface for reading and writing RRsets via a provider API.
//
// ## Implementations
//
// - Gandi LiveDNS v5: `gandi-ddns-livedns` crate
//
// ## Usage
//
// ```rust,ignore
// use gandi_ddns_core::{LiveRecord, ZoneProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* ZoneProvider implementation */;
//
//     let info = provider.domain_info("example.com").await?;
//     match provider.get_record(&info.zone_records_href, "@", &"A".into()).await? {
//         LiveRecord::Found(set) => println!("live: {:?}", set.values),
//         LiveRecord::Absent => println!("not in zone yet"),
//         LiveRecord::Unexpected(payload) => println!("odd reply: {payload}"),
//     }
//
//     Ok(())
// }
// ```

use crate::record::{RecordType, ResolvedRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Domain metadata returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Fully-qualified domain name
    #[serde(default)]
    pub fqdn: String,

    /// Base URL for every record read/write on this domain
    pub zone_records_href: String,
}

/// One live RRset, in the provider's wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Owner name
    #[serde(rename = "rrset_name")]
    pub name: String,

    /// Record type
    #[serde(rename = "rrset_type")]
    pub record_type: String,

    /// TTL in seconds
    #[serde(rename = "rrset_ttl", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// RRset content
    #[serde(rename = "rrset_values", default)]
    pub values: Vec<String>,
}

impl RecordSet {
    /// Wire body for writing a resolved record with the given TTL
    pub fn from_resolved(record: &ResolvedRecord, ttl: u32) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.to_string(),
            ttl: Some(ttl),
            values: record.values.clone(),
        }
    }
}

/// Live state of one (name, type) in the zone
///
/// The provider answers "exists", "absent" and "something else" from the same
/// endpoint; this is decoded once so the engine only matches on the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveRecord {
    /// The RRset exists
    Found(RecordSet),
    /// The provider reported "not found"
    Absent,
    /// Neither a matching RRset nor a not-found code
    Unexpected(Value),
}

impl LiveRecord {
    /// Classify a decoded response for the record called `name`
    ///
    /// A payload is `Found` only when its `rrset_name` equals `name`, and
    /// `Absent` only when it carries `code: 404`.
    pub fn classify(name: &str, payload: Value) -> Self {
        if payload.get("rrset_name").and_then(Value::as_str) == Some(name) {
            return match serde_json::from_value::<RecordSet>(payload.clone()) {
                Ok(set) => LiveRecord::Found(set),
                Err(_) => LiveRecord::Unexpected(payload),
            };
        }

        if payload.get("code").and_then(Value::as_u64) == Some(404) {
            return LiveRecord::Absent;
        }

        LiveRecord::Unexpected(payload)
    }

    /// Live values, if the record exists
    pub fn values(&self) -> Option<&[String]> {
        match self {
            LiveRecord::Found(set) => Some(&set.values),
            _ => None,
        }
    }
}

/// Result of a write
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    /// The provider accepted the RRset; carries its acknowledgement body
    Applied(Value),
    /// Dry-run mode: the request was logged, not sent
    DryRun,
}

/// Trait for zone provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - Perform HTTP/HTTPS API calls to their endpoints only
/// - Parse provider-specific responses into [`DomainInfo`], [`LiveRecord`], [`RecordSet`]
///
/// ## Forbidden Capabilities
/// - Retry or back off (a failed call is reported once)
/// - Decide whether a write is needed (owned by `ReconcilerEngine`)
/// - Cache anything beyond a single request
/// - Log the API key
///
/// Every method performs exactly one HTTP round trip.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Fetch domain metadata, including the zone-records endpoint
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo, crate::Error>;

    /// Fetch the live RRset for `name`/`record_type`
    ///
    /// # Returns
    ///
    /// - `Ok(LiveRecord)`: any JSON answer, classified
    /// - `Err(Error)`: transport failure or an error body that is not JSON
    async fn get_record(
        &self,
        zone_href: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Result<LiveRecord, crate::Error>;

    /// Create or replace the RRset (upsert) with the fixed TTL
    async fn put_record(
        &self,
        zone_href: &str,
        record: &ResolvedRecord,
    ) -> Result<PutOutcome, crate::Error>;

    /// List every RRset in the zone
    async fn list_records(&self, zone_href: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
