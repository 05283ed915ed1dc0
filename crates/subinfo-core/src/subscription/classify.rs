//! Turn raw subscription facts into a classified usage report.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::{
    formatting::{format_bytes, format_duration},
    subscription::types::{
        Availability, ExpiryState, SubscriptionFacts, UsageReport, Verdict, NOT_REPORTED,
        NO_EXPIRY, NO_EXPIRY_COUNTDOWN, OVER_QUOTA, UNKNOWN,
    },
};

/// Fixed rendering for expiry timestamps, in the offset of `now`.
pub const EXPIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classify `facts` as of `now`. Pure: same input, same report.
///
/// An expired subscription is always unavailable; otherwise availability
/// comes from the byte quota alone.
pub fn classify(facts: SubscriptionFacts, now: DateTime<FixedOffset>) -> UsageReport {
    let quota = classify_quota(&facts);
    let timing = classify_expiry(facts.expire_epoch_seconds, now);

    let availability = match timing.state {
        ExpiryState::Expired => Availability::Unavailable,
        ExpiryState::NotExpired | ExpiryState::Unknown => quota.availability,
    };

    UsageReport {
        upload_display: quantity_display(facts.upload_bytes),
        download_display: quantity_display(facts.download_bytes),
        facts,
        used_bytes: quota.used,
        remaining_bytes: quota.remaining,
        availability,
        expiry: timing.state,
        verdict: Verdict::decide(availability, timing.state),
        total_display: quota.total_display,
        used_display: quota.used_display,
        remaining_display: quota.remaining_display,
        expire_display: timing.expire_display,
        countdown_display: timing.countdown_display,
    }
}

struct Quota {
    used: Option<i64>,
    remaining: Option<i64>,
    availability: Availability,
    total_display: String,
    used_display: String,
    remaining_display: String,
}

fn classify_quota(facts: &SubscriptionFacts) -> Quota {
    // No total means no usage math at all, even if upload/download are known.
    let Some(total) = facts.total_bytes else {
        return Quota {
            used: None,
            remaining: None,
            availability: Availability::Unknown,
            total_display: NOT_REPORTED.to_string(),
            used_display: UNKNOWN.to_string(),
            remaining_display: UNKNOWN.to_string(),
        };
    };
    let total_display = bytes_display(total);

    let (Some(upload), Some(download)) = (facts.upload_bytes, facts.download_bytes) else {
        return Quota {
            used: None,
            remaining: None,
            availability: Availability::Unknown,
            total_display,
            used_display: UNKNOWN.to_string(),
            remaining_display: UNKNOWN.to_string(),
        };
    };

    let used = upload.saturating_add(download);
    let remaining = total.saturating_sub(used);
    let (availability, remaining_display) = match remaining.cmp(&0) {
        Ordering::Greater => (Availability::Available, bytes_display(remaining)),
        Ordering::Equal => (Availability::Unavailable, bytes_display(0)),
        Ordering::Less => (
            Availability::Unavailable,
            format!("{OVER_QUOTA} {}", format_bytes(remaining.unsigned_abs())),
        ),
    };

    Quota {
        used: Some(used),
        remaining: Some(remaining),
        availability,
        total_display,
        used_display: bytes_display(used),
        remaining_display,
    }
}

struct Timing {
    state: ExpiryState,
    expire_display: String,
    countdown_display: String,
}

fn classify_expiry(expire: Option<i64>, now: DateTime<FixedOffset>) -> Timing {
    let Some(expire) = expire else {
        return Timing {
            state: ExpiryState::Unknown,
            expire_display: NO_EXPIRY.to_string(),
            countdown_display: NO_EXPIRY_COUNTDOWN.to_string(),
        };
    };

    let expire_display = now
        .offset()
        .timestamp_opt(expire, 0)
        .single()
        .map(|dt| dt.format(EXPIRE_FORMAT).to_string())
        .unwrap_or_else(|| expire.to_string());

    let delta = expire.saturating_sub(now.timestamp());
    if delta <= 0 {
        Timing {
            state: ExpiryState::Expired,
            expire_display,
            countdown_display: format!("overdue by {}", format_duration(delta.unsigned_abs())),
        }
    } else {
        Timing {
            state: ExpiryState::NotExpired,
            expire_display,
            countdown_display: format!("remaining {}", format_duration(delta.unsigned_abs())),
        }
    }
}

fn quantity_display(v: Option<i64>) -> String {
    v.map(bytes_display)
        .unwrap_or_else(|| NOT_REPORTED.to_string())
}

fn bytes_display(v: i64) -> String {
    format_bytes(v.unsigned_abs())
}
