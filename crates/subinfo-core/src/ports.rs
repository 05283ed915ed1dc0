use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::Result;

/// What the core needs from an HTTP response: status and headers. The body
/// (the proxy config itself) is never read.
#[derive(Clone, Debug)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: HeaderMap,
}

/// Port for fetching a subscription link.
///
/// Implementations map network failures to [`crate::Error::Transport`]. The
/// query service enforces its own timeout on top of whatever the
/// implementation does.
#[async_trait]
pub trait SubscriptionFetcher: Send + Sync {
    async fn fetch(&self, link: &str) -> Result<FetchedResponse>;
}
