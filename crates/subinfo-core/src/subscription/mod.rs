//! Subscription-info engine: header scraping and usage classification.

pub mod classify;
pub mod extract;
pub mod types;

pub use classify::classify;
pub use extract::extract_facts;
pub use types::{Availability, ExpiryState, SubscriptionFacts, UsageReport, Verdict};
