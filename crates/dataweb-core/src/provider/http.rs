//! HTTP feed provider.

use std::time::Duration;

use tracing::debug;

use crate::model::FeedSnapshot;

use super::{FeedProvider, ProviderError};

/// Fetches the feed with a blocking HTTP GET.
pub struct HttpProvider {
    url: String,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedProvider for HttpProvider {
    fn fetch(&mut self) -> Result<FeedSnapshot, ProviderError> {
        // A blocking client owns its own runtime and must not be dropped on an
        // async worker, so it lives only for the duration of one fetch.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Http(format!("client setup failed: {}", e)))?;
        let resp = client
            .get(&self.url)
            .send()
            .map_err(|e| ProviderError::Http(format!("request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Http(format!("{} returned {}", self.url, status)));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ProviderError::Io(format!("reading body failed: {}", e)))?;
        debug!(url = %self.url, bytes = bytes.len(), "feed fetched");
        Ok(FeedSnapshot::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        format!("url {}", self.url)
    }
}
