//! Error types for the Believe market SDK

use crate::types::SourceKind;
use thiserror::Error;

/// Errors that can occur on a single upstream request
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-success status code
    #[error("{upstream} API error: HTTP {status}")]
    HttpStatus { upstream: &'static str, status: u16 },

    /// Well-formed response that does not contain the requested token
    #[error("{0}")]
    MissingRecord(String),

    /// Request could not complete
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Creates a MissingRecord error
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingRecord(msg.into())
    }

    /// Creates an InvalidResponse error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Failure of one aggregation source, tagged with the source it came from
#[derive(Debug, Error)]
#[error("{} data fetch failed: {error}", kind.label())]
pub struct SourceError {
    pub kind: SourceKind,
    #[source]
    pub error: FetchError,
}

impl SourceError {
    pub fn new(kind: SourceKind, error: FetchError) -> Self {
        Self { kind, error }
    }
}

/// Rejection of a single-source service operation
///
/// The message is prefixed with the operation that failed, e.g.
/// `Failed to fetch trending tokens: CoinGecko API error: HTTP 500`.
#[derive(Debug, Error)]
#[error("Failed to {operation}: {error}")]
pub struct ServiceError {
    pub operation: &'static str,
    #[source]
    pub error: FetchError,
}

impl ServiceError {
    pub fn new(operation: &'static str, error: FetchError) -> Self {
        Self { operation, error }
    }
}

/// Errors raised while building a tracker from configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Token address is not a valid base58 public key
    #[error("Invalid token address {address}: {reason}")]
    InvalidTokenAddress { address: String, reason: String },

    /// Environment override could not be parsed
    #[error("Invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
