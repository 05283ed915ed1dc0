//! reqwest-backed subscription fetcher.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    ports::{FetchedResponse, SubscriptionFetcher},
    Error, Result,
};

/// Proxy clients are identified by their User-Agent; providers only emit the
/// usage header for UAs they recognize.
pub const DEFAULT_USER_AGENT: &str = "ClashforWindows/0.19.21";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { http, timeout })
    }

    fn map_err(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::Transport(format!("timed out after {}s", self.timeout.as_secs()));
        }
        if e.is_builder() {
            return Error::Transport(format!("invalid link: {e}"));
        }
        Error::Transport(e.to_string())
    }
}

#[async_trait]
impl SubscriptionFetcher for HttpFetcher {
    async fn fetch(&self, link: &str) -> Result<FetchedResponse> {
        let resp = self
            .http
            .get(link)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        Ok(FetchedResponse {
            status: resp.status().as_u16(),
            headers: resp.headers().clone(),
        })
    }
}
