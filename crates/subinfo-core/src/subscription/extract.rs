//! Scrape subscription facts out of HTTP response headers.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::{
    subscription::types::SubscriptionFacts,
    Error, Result,
};

const CONTENT_DISPOSITION: &str = "content-disposition";
const PROFILE_WEB_PAGE_URL: &str = "profile-web-page-url";
const SUBSCRIPTION_USERINFO: &str = "subscription-userinfo";

/// Build [`SubscriptionFacts`] from a response status and its headers.
///
/// Error statuses fail before any header is looked at. A response without a
/// `Subscription-Userinfo` header fails with [`Error::NoUsageData`]; every
/// other header is optional.
pub fn extract_facts(link: &str, status: u16, headers: &HeaderMap) -> Result<SubscriptionFacts> {
    if status >= 400 {
        return Err(Error::Fetch { status });
    }

    let mut facts = SubscriptionFacts::new(link);

    if let Some(name) = headers
        .get(CONTENT_DISPOSITION)
        .map(header_text)
        .and_then(|cd| display_name_from_disposition(&cd))
    {
        facts.display_name = name;
    }

    facts.profile_web_page = headers
        .get(PROFILE_WEB_PAGE_URL)
        .map(header_text)
        .filter(|url| !url.is_empty());

    let mut values = headers.get_all(SUBSCRIPTION_USERINFO).iter().peekable();
    if values.peek().is_none() {
        return Err(Error::NoUsageData);
    }
    let raw = values.map(header_text).collect::<Vec<_>>().join(";");
    let usage = parse_usage_pairs(&raw);

    facts.upload_bytes = usage.get("upload").copied();
    facts.download_bytes = usage.get("download").copied();
    facts.total_bytes = usage.get("total").copied();
    facts.expire_epoch_seconds = usage.get("expire").copied();

    Ok(facts)
}

/// Collect every `letters=digits` pair in `raw`; later keys overwrite earlier
/// ones. Values that overflow `i64` are dropped.
pub fn parse_usage_pairs(raw: &str) -> HashMap<String, i64> {
    let mut out = HashMap::new();
    for (key, digits) in scan_pairs(raw) {
        match digits.parse::<i64>() {
            Ok(v) => {
                out.insert(key.to_string(), v);
            }
            Err(e) => {
                tracing::debug!(
                    key,
                    value = digits,
                    error = %e,
                    "dropping unparseable usage value"
                );
            }
        }
    }
    out
}

/// Tokenize `raw` into `(key, digits)` pairs.
///
/// A key is a maximal run of ASCII letters, directly followed by `=` and at
/// least one ASCII digit. Anything else is a separator.
fn scan_pairs(raw: &str) -> Vec<(&str, &str)> {
    let bytes = raw.as_bytes();
    let mut pairs = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if !bytes[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let key_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let key_end = i;

        if i < bytes.len() && bytes[i] == b'=' {
            let digits_start = i + 1;
            let mut j = digits_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > digits_start {
                pairs.push((&raw[key_start..key_end], &raw[digits_start..j]));
                i = j;
            }
        }
    }

    pairs
}

/// Pick the provider name out of a `Content-Disposition` value.
///
/// `filename*=UTF-8''...` wins over `filename="..."`; the last extension is
/// dropped. Returns `None` when neither yields a non-empty name.
fn display_name_from_disposition(value: &str) -> Option<String> {
    let mut extended: Option<String> = None;
    let mut plain: Option<String> = None;

    for part in value.split(';').map(str::trim) {
        if let Some(rest) = strip_prefix_ignore_case(part, "filename*=") {
            if let Some(decoded) =
                strip_prefix_ignore_case(rest, "utf-8''").and_then(percent_decode)
            {
                extended = Some(decoded);
            }
        } else if let Some(rest) = strip_prefix_ignore_case(part, "filename=") {
            plain = Some(rest.trim_matches('"').to_string());
        }
    }

    [extended, plain]
        .into_iter()
        .flatten()
        .map(|name| strip_extension(&name).to_string())
        .find(|name| !name.is_empty())
}

/// Query-style unescape: `+` is a space, `%XX` is a byte, result must be UTF-8.
fn percent_decode(encoded: &str) -> Option<String> {
    urlencoding::decode(&encoded.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

// Providers occasionally send raw UTF-8 in header values.
fn header_text(v: &HeaderValue) -> String {
    String::from_utf8_lossy(v.as_bytes()).into_owned()
}
