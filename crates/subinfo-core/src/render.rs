//! Telegram-HTML rendering of query results.

use crate::{
    formatting::escape_html,
    subscription::{UsageReport, Verdict},
    Error,
};

/// Placeholder posted while a query is running.
pub const FETCHING_PLACEHOLDER: &str = "🕰 Fetching subscription info...";

fn headline(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Valid => "✅ This subscription is valid",
        Verdict::Unavailable => "❌ This subscription is unavailable",
        Verdict::Unknown => "❓ This subscription's status is unknown",
    }
}

/// Full report for one subscription. `footer` is appended after a blank line.
pub fn render_report(report: &UsageReport, footer: Option<&str>) -> String {
    let facts = &report.facts;
    let name = escape_html(&facts.display_name);
    let provider = match facts.profile_web_page.as_deref() {
        Some(url) => format!("<a href=\"{}\">{name}</a>", escape_html(url)),
        None => name,
    };

    let mut lines = vec![
        format!("<b>{}</b>", headline(report.verdict)),
        format!("🔗<b>Link:</b> <code>{}</code>", escape_html(&facts.link)),
        format!("✈️<b>Provider:</b> {provider}"),
        format!("💧<b>Total:</b> <code>{}</code>", escape_html(&report.total_display)),
        format!(
            "⏳<b>Remaining:</b> <code>{}</code>",
            escape_html(&report.remaining_display)
        ),
        format!("📊<b>Used:</b> <code>{}</code>", escape_html(&report.used_display)),
        format!(
            "⬆️<b>Upload:</b> <code>{}</code>",
            escape_html(&report.upload_display)
        ),
        format!(
            "⬇️<b>Download:</b> <code>{}</code>",
            escape_html(&report.download_display)
        ),
        format!(
            "⏱️<b>Expires:</b> <code>{}</code>, {}",
            escape_html(&report.expire_display),
            escape_html(&report.countdown_display)
        ),
    ];

    if let Some(footer) = footer.filter(|f| !f.trim().is_empty()) {
        lines.push(String::new());
        lines.push(escape_html(footer));
    }

    lines.join("\n")
}

/// Message shown when a query fails.
pub fn render_failure(link: &str, err: &Error) -> String {
    format!(
        "<b>❌ Query failed</b>\n\nError while fetching <code>{}</code>:\n<code>{}</code>",
        escape_html(link),
        escape_html(&err.to_string())
    )
}
