/// Core error type for the subscription bot.
///
/// Adapter crates map their specific errors into this type so every query
/// failure can be reported to the user the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Upstream answered with an HTTP error status.
    #[error("server returned status {status}")]
    Fetch { status: u16 },

    /// Network failure or timeout while fetching the subscription.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response carried no `Subscription-Userinfo` header.
    #[error("no usage info returned, the subscription may have expired or been deleted")]
    NoUsageData,

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
