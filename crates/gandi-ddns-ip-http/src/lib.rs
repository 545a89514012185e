// # HTTP IP Source
//
// This crate provides the public IP source for gandi-ddns.
//
// ## Purpose
//
// Asks a plain-text echo service (e.g. ifconfig.me, icanhazip.com) which
// address the host appears to come from. The engine only uses this to detect
// NAT or misrouting: the published address is always the interface's.
//
// ## Architecture
//
// One GET per call, no polling, no caching. The response body is trimmed and
// parsed as an IP address; anything else is an error.

use async_trait::async_trait;
use gandi_ddns_core::traits::{IpSource, IpVersion};
use gandi_ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Default HTTP timeout for the echo request (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Echo services known to answer with a bare address
pub const KNOWN_IP_SERVICES: &[&str] = &[
    "https://ifconfig.me",
    "https://api.ipify.org",
    "https://icanhazip.com",
];

/// HTTP-based public IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// Address family to require (None = either)
    version: Option<IpVersion>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g. "https://ifconfig.me")
    /// - `version`: address family to require; pinning a family also binds
    ///   the client to it so a dual-stack host asks over the right one
    pub fn new(url: impl Into<String>, version: Option<IpVersion>) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        let mut builder = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT);
        builder = match version {
            Some(IpVersion::V4) => builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            Some(IpVersion::V6) => builder.local_address(IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
            None => builder,
        };

        let client = builder
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            version,
            client,
        })
    }

    /// The URL queried
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from the echo service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered with status {}",
                self.url,
                response.status()
            )));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("failed to read response: {}", e)))?;

        parse_ip(&ip_text, self.version)
    }
}

/// Parse an echo-service body into an address of the wanted family
fn parse_ip(body: &str, version: Option<IpVersion>) -> Result<IpAddr> {
    let ip_text = body.trim();

    let ip: IpAddr = ip_text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {:?}", ip_text)))?;

    match version {
        Some(wanted) if IpVersion::of(&ip) != wanted => Err(Error::ip_source(format!(
            "Expected {:?} address, got: {}",
            wanted, ip
        ))),
        _ => Ok(ip),
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("{} reports {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }

    fn version(&self) -> Option<IpVersion> {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_ip_trims_whitespace() {
        assert_eq!(
            parse_ip("  203.0.113.9\n", None).unwrap(),
            IpAddr::from([203, 0, 113, 9])
        );
    }

    #[test]
    fn test_parse_ip_family_filter() {
        assert!(parse_ip("2001:db8::1", Some(IpVersion::V4)).is_err());
        assert!(parse_ip("2001:db8::1", Some(IpVersion::V6)).is_ok());
        assert!(parse_ip("198.51.100.1", Some(IpVersion::V4)).is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            HttpIpSource::new("ftp://ifconfig.me", None),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_fetches_plain_text_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.7\n"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri(), None).unwrap();
        let ip = source.current().await.unwrap();

        assert_eq!(ip, IpAddr::from([198, 51, 100, 7]));
    }

    #[tokio::test]
    async fn test_garbage_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri(), None).unwrap();
        assert!(matches!(source.current().await, Err(Error::IpSource(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("198.51.100.7"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri(), None).unwrap();
        assert!(matches!(source.current().await, Err(Error::IpSource(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) on localhost is not served by anything in tests
        let source = HttpIpSource::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(source.current().await, Err(Error::Http(_))));
    }

    #[test]
    fn test_source_metadata() {
        let source = HttpIpSource::new(KNOWN_IP_SERVICES[0], Some(IpVersion::V4)).unwrap();
        assert_eq!(source.source_name(), "http");
        assert_eq!(source.version(), Some(IpVersion::V4));
        assert_eq!(source.url(), "https://ifconfig.me");
    }
}
