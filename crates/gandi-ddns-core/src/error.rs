//! Error types for gandi-ddns
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for gandi-ddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gandi-ddns
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// The WAN interface does not exist or carries no IPv4 address
    #[error("No IPv4 address found on interface {0}")]
    InterfaceNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file syntax errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport errors (connection refused, timeout, unreadable body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-2xx status and a JSON error body
    #[error("API error ({status}): {payload}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Decoded error body
        payload: serde_json::Value,
    },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create an "interface has no address" error
    pub fn interface_not_found(interface: impl Into<String>) -> Self {
        Self::InterfaceNotFound(interface.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an API error from a decoded error body
    pub fn api(status: u16, payload: serde_json::Value) -> Self {
        Self::Api { status, payload }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
