// # Gandi LiveDNS Provider
//
// This crate provides the Gandi LiveDNS v5 zone provider for gandi-ddns.
//
// ## Behaviour
//
// - One HTTP request per trait call, no retry and no backoff
// - HTTP timeout configured (30 seconds)
// - JSON error bodies are handed back to the caller, not swallowed
// - Dry-run mode: reads are performed, writes are only logged
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if the key is empty
//
// ## API Reference
//
// - Domain metadata: GET `/domains/:fqdn` (yields `zone_records_href`)
// - Read RRset: GET `{zone_records_href}/:name/:type`
// - Upsert RRset: PUT `{zone_records_href}/:name/:type`
// - List RRsets: GET `{zone_records_href}`
//
// Authentication is a single `X-Api-Key` header.

use async_trait::async_trait;
use gandi_ddns_core::record::DEFAULT_TTL;
use gandi_ddns_core::traits::{DomainInfo, LiveRecord, PutOutcome, RecordSet, ZoneProvider};
use gandi_ddns_core::{Error, RecordType, ResolvedRecord, Result};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Gandi LiveDNS v5 API base URL
pub const LIVEDNS_API_BASE: &str = "https://dns.api.gandi.net/api/v5";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication header name
const API_KEY_HEADER: &str = "X-Api-Key";

/// A decoded API answer
///
/// LiveDNS returns JSON for both successes and most errors; the caller
/// decides what an error body means for its operation.
#[derive(Debug)]
enum Reply {
    /// 2xx with a JSON body
    Success(Value),
    /// Non-2xx with a JSON body
    Failure { status: u16, payload: Value },
}

/// Gandi LiveDNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (domain lookup, record lookup, listing)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct GandiProvider {
    /// LiveDNS API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL (overridable for tests and staging endpoints)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiProvider {
    /// Create a new LiveDNS provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: LiveDNS API key
    /// - `base_url`: API root, normally [`LIVEDNS_API_BASE`]
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the key is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider against the public API (live mode)
    pub fn new_live(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, LIVEDNS_API_BASE, false)
    }

    /// Create a provider against the public API (dry-run mode)
    ///
    /// In dry-run mode, the provider performs all GET requests but skips
    /// PUT updates, logging what would have been changed.
    pub fn new_dry_run(api_key: impl Into<String>) -> Result<Self> {
        Self::new(api_key, LIVEDNS_API_BASE, true)
    }

    /// Whether writes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Authenticated request builder
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and decode the JSON answer
    ///
    /// Non-2xx answers are logged with their body. An empty 2xx body decodes
    /// as `null`; any other body that is not JSON is an error whatever the
    /// status.
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Reply> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("reading response from {} failed: {}", url, e)))?;

        if !status.is_success() {
            tracing::warn!("Failed request to {} ({}): {}", url, status.as_u16(), body);
        }

        if status.is_success() && body.trim().is_empty() {
            return Ok(Reply::Success(Value::Null));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                "gandi",
                format!("non-JSON response from {} ({}): {}", url, status.as_u16(), e),
            )
        })?;

        if status.is_success() {
            Ok(Reply::Success(payload))
        } else {
            Ok(Reply::Failure {
                status: status.as_u16(),
                payload,
            })
        }
    }

    /// URL of one RRset
    fn record_url(zone_href: &str, name: &str, record_type: &RecordType) -> String {
        format!("{}/{}/{}", zone_href.trim_end_matches('/'), name, record_type)
    }
}

#[async_trait]
impl ZoneProvider for GandiProvider {
    /// Look up a domain
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /domains/example.com
    /// X-Api-Key: <key>
    /// ```
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo> {
        let url = format!("{}/domains/{}", self.base_url, domain);
        tracing::debug!("Looking up domain: {}", domain);

        match self.send(&url, self.request(Method::GET, &url)).await? {
            Reply::Success(payload) => {
                let info: DomainInfo = serde_json::from_value(payload)?;
                tracing::debug!("Zone records for {}: {}", domain, info.zone_records_href);
                Ok(info)
            }
            Reply::Failure { status, payload } => Err(Error::api(status, payload)),
        }
    }

    /// Read one RRset
    ///
    /// Error bodies are classified rather than rejected: LiveDNS reports a
    /// missing record as a 404 with `code: 404`.
    async fn get_record(
        &self,
        zone_href: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Result<LiveRecord> {
        let url = Self::record_url(zone_href, name, record_type);
        tracing::debug!("Reading RRset: {} {}", record_type, name);

        let payload = match self.send(&url, self.request(Method::GET, &url)).await? {
            Reply::Success(payload) => payload,
            Reply::Failure { payload, .. } => payload,
        };

        Ok(LiveRecord::classify(name, payload))
    }

    /// Create or replace one RRset
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT {zone_records_href}/www/A
    /// X-Api-Key: <key>
    /// {
    ///   "rrset_name": "www",
    ///   "rrset_type": "A",
    ///   "rrset_ttl": 1200,
    ///   "rrset_values": ["1.2.3.4"]
    /// }
    /// ```
    async fn put_record(&self, zone_href: &str, record: &ResolvedRecord) -> Result<PutOutcome> {
        let url = Self::record_url(zone_href, &record.name, &record.record_type);
        let body = RecordSet::from_resolved(record, DEFAULT_TTL);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return Ok(PutOutcome::DryRun);
        }

        let request = self.request(Method::PUT, &url).json(&body);
        match self.send(&url, request).await? {
            Reply::Success(ack) => {
                tracing::debug!("LiveDNS accepted {} {}: {}", record.record_type, record.name, ack);
                Ok(PutOutcome::Applied(ack))
            }
            Reply::Failure { status, payload } => Err(Error::api(status, payload)),
        }
    }

    async fn list_records(&self, zone_href: &str) -> Result<Vec<RecordSet>> {
        match self.send(zone_href, self.request(Method::GET, zone_href)).await? {
            Reply::Success(payload) => Ok(serde_json::from_value(payload)?),
            Reply::Failure { status, payload } => Err(Error::api(status, payload)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "gandi"
    }
}
