//! Formatting utilities (Telegram HTML escaping, byte counts, durations).

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const BYTE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Render a byte count in the largest 1024-step unit that keeps the value at
/// or above one, with two decimals (truncated, not rounded).
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let truncated = (value * 100.0).floor() / 100.0;
    format!("{truncated:.2} {}", BYTE_UNITS[unit])
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Render a non-negative duration using the coarsest window it exceeds:
/// `1d 2h 3m 4s`, `2h 3m 4s`, `3m 4s` or `4s`.
pub fn format_duration(seconds: u64) -> String {
    let s = seconds;
    if s > DAY {
        return format!(
            "{}d {}h {}m {}s",
            s / DAY,
            (s % DAY) / HOUR,
            (s % HOUR) / MINUTE,
            s % MINUTE
        );
    }
    if s > HOUR {
        return format!("{}h {}m {}s", s / HOUR, (s % HOUR) / MINUTE, s % MINUTE);
    }
    if s > MINUTE {
        return format!("{}m {}s", s / MINUTE, s % MINUTE);
    }
    format!("{s}s")
}
