//! Remote content retrieval.
//!
//! Paths starting with `http://` or `https://` are never read from disk;
//! they are handed to a [`RemoteFetcher`].

use std::time::Duration;

/// Error type returned by fetcher implementations.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Status and body of a fetched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Loads the bytes behind a URL.
pub trait RemoteFetcher: Send + Sync + std::fmt::Debug {
    fn fetch(
        &self,
        url: &str,
        connect_timeout: Duration,
        network_timeout: Duration,
    ) -> Result<FetchResponse, FetchError>;
}

const REMOTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Whether `path` names a remote document. The scheme is case-insensitive.
pub fn is_remote(path: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

/// Blocking HTTP client backed by `reqwest`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

#[cfg(feature = "http")]
impl RemoteFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        connect_timeout: Duration,
        network_timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(network_timeout)
            .build()?;
        let response = client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(FetchResponse { status, body })
    }
}

#[cfg(feature = "http")]
pub(crate) fn default_fetcher() -> Option<std::sync::Arc<dyn RemoteFetcher>> {
    Some(std::sync::Arc::new(HttpFetcher))
}

#[cfg(not(feature = "http"))]
pub(crate) fn default_fetcher() -> Option<std::sync::Arc<dyn RemoteFetcher>> {
    None
}
