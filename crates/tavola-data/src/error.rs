//! HTTP client error types.

use tavola_commerce::CommerceError;
use thiserror::Error;

/// Errors that can occur when calling the Tavola API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Non-2xx response.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Could not reach the server.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Invalid base URL or path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Superseded by a newer call before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            FetchError::Connection(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

impl From<FetchError> for CommerceError {
    fn from(e: FetchError) -> Self {
        CommerceError::Gateway(e.to_string())
    }
}
