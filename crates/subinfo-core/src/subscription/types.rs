use serde::Serialize;

/// Display name used when the provider sends no usable filename.
pub const UNKNOWN_PROVIDER: &str = "Unknown provider";
/// Shown for a quantity the provider did not report.
pub const NOT_REPORTED: &str = "not reported";
/// Shown when a derived quantity cannot be computed.
pub const UNKNOWN: &str = "unknown";
/// Expiry display when the provider reports no expiry at all.
pub const NO_EXPIRY: &str = "♾️ never";
/// Countdown text when there is no expiry.
pub const NO_EXPIRY_COUNTDOWN: &str =
    "possibly an unlimited subscription, or the provider is having issues";
/// Prefix for a negative remaining quota.
pub const OVER_QUOTA: &str = "over quota by";

/// Raw facts scraped from a subscription response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubscriptionFacts {
    pub link: String,
    pub display_name: String,
    pub profile_web_page: Option<String>,
    pub upload_bytes: Option<i64>,
    pub download_bytes: Option<i64>,
    pub total_bytes: Option<i64>,
    pub expire_epoch_seconds: Option<i64>,
}

impl SubscriptionFacts {
    /// Facts for `link` with nothing known yet.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            display_name: UNKNOWN_PROVIDER.to_string(),
            profile_web_page: None,
            upload_bytes: None,
            download_bytes: None,
            total_bytes: None,
            expire_epoch_seconds: None,
        }
    }
}

/// Byte-quota availability, overridden to `Unavailable` once expired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryState {
    NotExpired,
    Expired,
    Unknown,
}

/// Headline status of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Unavailable,
    Unknown,
}

impl Verdict {
    /// Combine byte availability and expiry into one headline.
    ///
    /// Anything known to be bad wins; a known good signal (quota left, or an
    /// expiry not yet reached) beats an unknown one; only when nothing is
    /// known is the status unknown.
    pub fn decide(availability: Availability, expiry: ExpiryState) -> Self {
        match (availability, expiry) {
            (Availability::Unavailable, _) | (_, ExpiryState::Expired) => Verdict::Unavailable,
            (Availability::Available, _) | (Availability::Unknown, ExpiryState::NotExpired) => {
                Verdict::Valid
            }
            (Availability::Unknown, ExpiryState::Unknown) => Verdict::Unknown,
        }
    }
}

/// Classified view of one subscription, ready for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub facts: SubscriptionFacts,
    pub used_bytes: Option<i64>,
    pub remaining_bytes: Option<i64>,
    pub availability: Availability,
    pub expiry: ExpiryState,
    pub verdict: Verdict,
    pub total_display: String,
    pub upload_display: String,
    pub download_display: String,
    pub used_display: String,
    pub remaining_display: String,
    pub expire_display: String,
    pub countdown_display: String,
}
