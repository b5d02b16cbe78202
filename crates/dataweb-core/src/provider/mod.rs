//! Provider abstraction for feed snapshot sources.
//!
//! A `FeedProvider` yields one freshly decoded `FeedSnapshot` per call.
//! The web server polls it on every tick; the dump tool calls it once.

mod file;
#[cfg(feature = "http")]
mod http;

pub use file::FileProvider;
#[cfg(feature = "http")]
pub use http::HttpProvider;

use crate::model::FeedSnapshot;

/// Error types that can occur while fetching a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// I/O error while reading the feed.
    Io(String),
    /// Transport or HTTP status error.
    Http(String),
    /// Payload is not a valid feed snapshot.
    Malformed(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Io(msg) => write!(f, "I/O error: {}", msg),
            ProviderError::Http(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Malformed(msg) => write!(f, "Malformed snapshot: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Malformed(e.to_string())
    }
}

/// Abstraction for feed sources.
///
/// Implementations are blocking; async callers run `fetch` on a blocking
/// thread.
pub trait FeedProvider {
    /// Fetches and decodes the current snapshot.
    fn fetch(&mut self) -> Result<FeedSnapshot, ProviderError>;

    /// Human-readable source description for logs.
    fn describe(&self) -> String;
}

impl<P: FeedProvider + ?Sized> FeedProvider for Box<P> {
    fn fetch(&mut self) -> Result<FeedSnapshot, ProviderError> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
