use std::{env, fs, path::Path, time::Duration};

use chrono::FixedOffset;

use crate::{errors::Error, fetch, query::QuerySettings, Result};

const TOKEN_KEY: &str = "TELEGRAM_BOT_TOKEN";
const DEFAULT_DISPLAY_OFFSET: &str = "+08:00";

/// Typed bot configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Fetching
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub max_concurrent_queries: usize,

    // Group chat cleanup
    pub group_report_ttl: Duration,
    pub group_notice_ttl: Duration,

    // Rendering
    pub display_offset: FixedOffset,
    pub report_footer: Option<String>,
}

impl Config {
    /// Load from the process environment. The bot token may also be given as
    /// the first command-line argument.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let arg_token = env::args().nth(1);
        Self::from_lookup(|key| {
            let value = env_str(key).and_then(non_empty);
            if key == TOKEN_KEY {
                value.or_else(|| arg_token.clone().and_then(non_empty))
            } else {
                value
            }
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup(TOKEN_KEY)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{TOKEN_KEY} environment variable (or first argument) is required"
                ))
            })?;

        let fetch_timeout = Duration::from_millis(
            parse_u64(&lookup, "FETCH_TIMEOUT_MS")?
                .unwrap_or(fetch::DEFAULT_FETCH_TIMEOUT.as_millis() as u64),
        );
        let user_agent = lookup("SUBSCRIPTION_USER_AGENT")
            .and_then(non_empty)
            .unwrap_or_else(|| fetch::DEFAULT_USER_AGENT.to_string());
        let max_concurrent_queries = parse_u64(&lookup, "MAX_CONCURRENT_QUERIES")?
            .unwrap_or(8)
            .max(1) as usize;

        let group_report_ttl = Duration::from_secs(
            parse_u64(&lookup, "GROUP_REPORT_TTL_SECS")?.unwrap_or(15 * 86_400),
        );
        let group_notice_ttl =
            Duration::from_secs(parse_u64(&lookup, "GROUP_NOTICE_TTL_SECS")?.unwrap_or(10));

        let raw_offset = lookup("DISPLAY_UTC_OFFSET")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_DISPLAY_OFFSET.to_string());
        let display_offset = parse_utc_offset(&raw_offset).ok_or_else(|| {
            Error::Config(format!("DISPLAY_UTC_OFFSET: invalid offset {raw_offset:?}"))
        })?;
        let report_footer = lookup("REPORT_FOOTER").and_then(non_empty);

        Ok(Self {
            telegram_bot_token,
            fetch_timeout,
            user_agent,
            max_concurrent_queries,
            group_report_ttl,
            group_notice_ttl,
            display_offset,
            report_footer,
        })
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            fetch_timeout: self.fetch_timeout,
            max_concurrent: self.max_concurrent_queries,
            group_report_ttl: self.group_report_ttl,
            display_offset: self.display_offset,
            footer: self.report_footer.clone(),
        }
    }
}

/// Accepts `+08:00`, `-0530`, `+8`, `Z` and `UTC`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => (1, raw),
    };
    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key}: {e}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
