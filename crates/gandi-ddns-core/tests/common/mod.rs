//! Test doubles and common utilities for reconciliation tests
//!
//! These doubles script the provider's answers and record every call so the
//! tests can assert on exactly which writes the engine issued.

#![allow(dead_code)]

use gandi_ddns_core::error::{Error, Result};
use gandi_ddns_core::traits::{DomainInfo, IpSource, LiveRecord, PutOutcome, RecordSet, ZoneProvider};
use gandi_ddns_core::{
    GandiDdnsConfig, IpResolver, MemoryNotifier, ReconcilerEngine, RecordType, ResolvedRecord,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource that always returns the same address
pub struct FixedIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new FixedIpSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An IpSource that always fails with the given error kind
pub enum FailingIpSource {
    NoInterface,
    Unreachable,
}

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        match self {
            FailingIpSource::NoInterface => Err(Error::interface_not_found("eth9")),
            FailingIpSource::Unreachable => Err(Error::http("connection refused")),
        }
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// A scripted ZoneProvider that tracks calls
///
/// Unknown records answer with LiveDNS's 404 body. Accepted writes are
/// visible to later reads.
pub struct MockZoneProvider {
    /// Scripted GET payloads, keyed by (zone href, name, type)
    payloads: Arc<Mutex<HashMap<(String, String, String), Value>>>,
    /// Domains whose metadata lookup fails
    failing_domains: HashSet<String>,
    /// Records whose read fails at the transport level
    failing_reads: HashSet<(String, String)>,
    /// Reject every write with a 400 payload
    reject_writes: bool,
    /// Answer writes with PutOutcome::DryRun
    dry_run: bool,
    /// Recorded writes (zone href, record)
    puts: Arc<Mutex<Vec<(String, ResolvedRecord)>>>,
    /// Call counter for get_record()
    get_call_count: Arc<AtomicUsize>,
}

impl MockZoneProvider {
    pub fn new() -> Self {
        Self {
            payloads: Arc::new(Mutex::new(HashMap::new())),
            failing_domains: HashSet::new(),
            failing_reads: HashSet::new(),
            reject_writes: false,
            dry_run: false,
            puts: Arc::new(Mutex::new(Vec::new())),
            get_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Zone href handed out for a domain
    pub fn href_for(domain: &str) -> String {
        format!("https://livedns.test/api/v5/zones/{}/records", domain)
    }

    /// Script an existing RRset
    pub fn with_live(self, domain: &str, name: &str, rtype: &str, values: &[&str]) -> Self {
        self.with_payload(
            domain,
            name,
            rtype,
            json!({
                "rrset_name": name,
                "rrset_type": rtype,
                "rrset_ttl": 1200,
                "rrset_values": values,
            }),
        )
    }

    /// Script an arbitrary GET payload
    pub fn with_payload(self, domain: &str, name: &str, rtype: &str, payload: Value) -> Self {
        self.payloads.lock().unwrap().insert(
            (Self::href_for(domain), name.to_string(), rtype.to_string()),
            payload,
        );
        self
    }

    pub fn with_failing_domain(mut self, domain: &str) -> Self {
        self.failing_domains.insert(domain.to_string());
        self
    }

    pub fn with_failing_read(mut self, name: &str, rtype: &str) -> Self {
        self.failing_reads.insert((name.to_string(), rtype.to_string()));
        self
    }

    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Get the list of writes issued so far
    pub fn puts(&self) -> Vec<(String, ResolvedRecord)> {
        self.puts.lock().unwrap().clone()
    }

    /// Get the number of times get_record() was called
    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Create a new MockZoneProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            payloads: Arc::clone(&other.payloads),
            failing_domains: other.failing_domains.clone(),
            failing_reads: other.failing_reads.clone(),
            reject_writes: other.reject_writes,
            dry_run: other.dry_run,
            puts: Arc::clone(&other.puts),
            get_call_count: Arc::clone(&other.get_call_count),
        }
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MockZoneProvider {
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo> {
        if self.failing_domains.contains(domain) {
            return Err(Error::api(
                404,
                json!({"code": 404, "message": "Domain not found", "object": "domain"}),
            ));
        }

        Ok(DomainInfo {
            fqdn: domain.to_string(),
            zone_records_href: Self::href_for(domain),
        })
    }

    async fn get_record(
        &self,
        zone_href: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Result<LiveRecord> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);

        if self
            .failing_reads
            .contains(&(name.to_string(), record_type.to_string()))
        {
            return Err(Error::http("operation timed out"));
        }

        let payload = self
            .payloads
            .lock()
            .unwrap()
            .get(&(zone_href.to_string(), name.to_string(), record_type.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                json!({"code": 404, "message": "Can't find the DNS record", "object": "dns-record"})
            });

        Ok(LiveRecord::classify(name, payload))
    }

    async fn put_record(&self, zone_href: &str, record: &ResolvedRecord) -> Result<PutOutcome> {
        if self.reject_writes {
            return Err(Error::api(
                400,
                json!({"code": 400, "message": "Validation error", "object": "dns-record"}),
            ));
        }

        if self.dry_run {
            return Ok(PutOutcome::DryRun);
        }

        self.payloads.lock().unwrap().insert(
            (
                zone_href.to_string(),
                record.name.clone(),
                record.record_type.to_string(),
            ),
            json!({
                "rrset_name": record.name,
                "rrset_type": record.record_type.as_str(),
                "rrset_ttl": 1200,
                "rrset_values": record.values,
            }),
        );
        self.puts
            .lock()
            .unwrap()
            .push((zone_href.to_string(), record.clone()));

        Ok(PutOutcome::Applied(json!({"message": "DNS Record Created"})))
    }

    async fn list_records(&self, zone_href: &str) -> Result<Vec<RecordSet>> {
        let payloads = self.payloads.lock().unwrap();
        Ok(payloads
            .iter()
            .filter(|((href, _, _), _)| href == zone_href)
            .filter_map(|(_, payload)| serde_json::from_value(payload.clone()).ok())
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build an engine with a fixed local/public IP pair
pub fn engine_with(
    config: &GandiDdnsConfig,
    local: IpAddr,
    public: IpAddr,
    provider: MockZoneProvider,
    notifier: &MemoryNotifier,
) -> ReconcilerEngine {
    let resolver = IpResolver::new(
        Box::new(FixedIpSource::new(local)),
        Box::new(FixedIpSource::new(public)),
    );

    ReconcilerEngine::new(resolver, Box::new(provider), Box::new(notifier.clone()), config)
        .expect("engine construction succeeds")
}

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}
