//! Configuration types for gandi-ddns
//!
//! The config file is TOML. Records are grouped by domain; a record without
//! `values` is filled in with the host's IP at run time.
//!
//! ```toml
//! wan_device = "enp2s0"
//! gandi_api_key = "..."                      # or GANDI_APIKEY
//! notify_script = "/usr/local/bin/pushover"  # optional
//!
//! [[domains."foobar.org"]]
//! type = "A"
//! name = "@"
//!
//! [[domains."foobar.org"]]
//! type = "MX"
//! name = "@"
//! values = ["10 one-val.com.", "20 other-val.com."]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::record::{Record, ValueComparison};
use crate::{Error, Result};

/// Environment variable that overrides `gandi_api_key`
pub const API_KEY_ENV: &str = "GANDI_APIKEY";

/// Desired records, keyed by lower-cased domain name
///
/// Domains iterate in sorted order; records keep declaration order.
pub type DesiredState = BTreeMap<String, Vec<Record>>;

/// Main gandi-ddns configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GandiDdnsConfig {
    /// Interface whose IPv4 address is published (e.g. "enp2s0")
    #[serde(default)]
    pub wan_device: String,

    /// LiveDNS API key (the environment override wins)
    #[serde(default)]
    pub gandi_api_key: Option<String>,

    /// Program run with a single message argument on notable events
    #[serde(default)]
    pub notify_script: Option<String>,

    /// Plain-text "what is my IP" endpoint
    #[serde(default = "default_ip_source_url")]
    pub ip_source_url: String,

    /// LiveDNS API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// How live and desired RRsets are compared
    #[serde(default)]
    pub value_comparison: ValueComparison,

    /// Desired records per domain
    #[serde(default)]
    pub domains: DesiredState,
}

// Keeps the API key out of logs
impl fmt::Debug for GandiDdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GandiDdnsConfig")
            .field("wan_device", &self.wan_device)
            .field(
                "gandi_api_key",
                &self.gandi_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("notify_script", &self.notify_script)
            .field("ip_source_url", &self.ip_source_url)
            .field("api_base", &self.api_base)
            .field("value_comparison", &self.value_comparison)
            .field("domains", &self.domains)
            .finish()
    }
}

impl GandiDdnsConfig {
    /// Create a new configuration with defaults
    pub fn new(wan_device: impl Into<String>) -> Self {
        Self {
            wan_device: wan_device.into(),
            gandi_api_key: None,
            notify_script: None,
            ip_source_url: default_ip_source_url(),
            api_base: default_api_base(),
            value_comparison: ValueComparison::default(),
            domains: DesiredState::new(),
        }
    }

    /// Add a record under a domain (builder style)
    pub fn with_record(mut self, domain: &str, record: Record) -> Self {
        self.domains
            .entry(domain.to_ascii_lowercase())
            .or_default()
            .push(record);
        self
    }

    /// Read and parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("config file not readable: {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse config text and normalize it
    ///
    /// - domain names are lower-cased
    /// - empty `values` lists become unset
    /// - blank optional strings become unset
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: GandiDdnsConfig = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        let domains = std::mem::take(&mut self.domains);
        for (domain, records) in domains {
            let records = records.into_iter().map(|mut record| {
                record.name = record.name.trim().to_string();
                if record.values.as_ref().is_some_and(|v| v.is_empty()) {
                    record.values = None;
                }
                record
            });
            self.domains
                .entry(domain.trim().to_ascii_lowercase())
                .or_default()
                .extend(records);
        }

        self.wan_device = self.wan_device.trim().to_string();
        if self.gandi_api_key.as_ref().is_some_and(|k| k.trim().is_empty()) {
            self.gandi_api_key = None;
        }
        if self.notify_script.as_ref().is_some_and(|s| s.trim().is_empty()) {
            self.notify_script = None;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.wan_device.is_empty() {
            return Err(Error::config("wan_device must be specified"));
        }

        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "ip_source_url must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            )));
        }

        if !self.api_base.starts_with("https://") && !self.api_base.starts_with("http://") {
            return Err(Error::config(format!(
                "api_base must use HTTP or HTTPS scheme. Got: {}",
                self.api_base
            )));
        }

        for (domain, records) in &self.domains {
            validate_domain_name(domain)?;

            for record in records {
                if record.record_type.as_str().is_empty() {
                    return Err(Error::config(format!("record in {} has an empty type", domain)));
                }
                if !record.record_type.is_ptr() && record.name.is_empty() {
                    return Err(Error::config(format!(
                        "{} record in {} needs a name (use \"@\" for the apex)",
                        record.record_type, domain
                    )));
                }
            }
        }

        Ok(())
    }

    /// The API key to use, the environment override taking precedence
    pub fn api_key(&self) -> Result<String> {
        self.api_key_with_override(std::env::var(API_KEY_ENV).ok())
    }

    /// Like [`api_key`](Self::api_key) with an explicit override value
    pub fn api_key_with_override(&self, env_override: Option<String>) -> Result<String> {
        env_override
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.gandi_api_key.clone())
            .ok_or_else(|| {
                Error::config(format!(
                    "no API key: set gandi_api_key in the config file or {}",
                    API_KEY_ENV
                ))
            })
    }

    /// Total number of declared records
    pub fn record_count(&self) -> usize {
        self.domains.values().map(Vec::len).sum()
    }
}

impl Default for GandiDdnsConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches common typos, not every invalid name.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.trim_end_matches('.').split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{}'", domain)));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn default_ip_source_url() -> String {
    "https://ifconfig.me".to_string()
}

fn default_api_base() -> String {
    "https://dns.api.gandi.net/api/v5".to_string()
}
