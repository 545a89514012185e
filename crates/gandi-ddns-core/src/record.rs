//! Desired DNS records and their resolution against the detected IP
//!
//! A [`Record`] is what the operator declared; a [`ResolvedRecord`] is what
//! gets compared against (and written to) the live zone. Resolution is a pure
//! function of the record, its domain and the local IP, so it can be tested
//! without any I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// TTL attached to every RRset written to the zone (seconds)
pub const DEFAULT_TTL: u32 = 1200;

/// DNS resource record type, normalized to upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RecordType(String);

impl RecordType {
    /// Create a record type from any casing (`"mx"` becomes `"MX"`)
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_uppercase())
    }

    /// The upper-cased type string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reverse-mapping records get their name and value computed
    pub fn is_ptr(&self) -> bool {
        self.0 == "PTR"
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.0
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One desired DNS resource record, as declared in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record type (A, CNAME, MX, PTR, ...)
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Owner name within the domain (`@`, `mail`, ...); ignored for PTR
    #[serde(default)]
    pub name: String,

    /// Record content; `None` means "fill in the host's IP"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Record {
    /// Create a record whose value will be the detected IP
    pub fn new(record_type: impl Into<RecordType>, name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
            values: None,
        }
    }

    /// Set explicit values
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve placeholders against the local IP
    ///
    /// - unset values become `[local_ip]`
    /// - PTR records are keyed by the reverse name of `local_ip` and point
    ///   back at `{domain}.`
    pub fn resolve(&self, domain: &str, local_ip: IpAddr) -> ResolvedRecord {
        if self.record_type.is_ptr() {
            return ResolvedRecord {
                record_type: self.record_type.clone(),
                name: reverse_pointer_name(local_ip),
                values: vec![format!("{}.", domain.trim_end_matches('.'))],
            };
        }

        let values = match &self.values {
            Some(values) if !values.is_empty() => values.clone(),
            _ => vec![local_ip.to_string()],
        };

        ResolvedRecord {
            record_type: self.record_type.clone(),
            name: self.name.clone(),
            values,
        }
    }
}

/// A record with every placeholder filled in
///
/// Invariant: `values` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    /// Record type
    pub record_type: RecordType,
    /// Owner name as sent to the provider
    pub name: String,
    /// Desired RRset content, in declaration order
    pub values: Vec<String>,
}

impl fmt::Display for ResolvedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.record_type, self.name, describe_values(Some(&self.values)))
    }
}

/// Render an optional RRset for logs and notifications
pub fn describe_values(values: Option<&[String]>) -> String {
    match values {
        None => "nothing".to_string(),
        Some(values) => format!("[{}]", values.join(", ")),
    }
}

/// Reverse-DNS owner name for an address
///
/// `5.6.7.8` becomes `8.7.6.5.in-addr.arpa.`; IPv6 addresses use the
/// nibble form under `ip6.arpa.`.
pub fn reverse_pointer_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa.")
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(73);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str("ip6.arpa.");
            name
        }
    }
}

/// How a live RRset is compared with the desired one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueComparison {
    /// Element-for-element, same order (reordering triggers a write)
    #[default]
    Ordered,
    /// Same values regardless of order
    Unordered,
}

impl ValueComparison {
    /// Whether the live RRset already matches; an absent record never does
    pub fn values_match(&self, live: Option<&[String]>, desired: &[String]) -> bool {
        let Some(live) = live else {
            return false;
        };

        match self {
            ValueComparison::Ordered => live == desired,
            ValueComparison::Unordered => {
                let mut live = live.to_vec();
                let mut desired = desired.to_vec();
                live.sort();
                desired.sort();
                live == desired
            }
        }
    }
}
