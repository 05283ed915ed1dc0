//! Finding subscription links in chat messages.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::ChatKind;

/// Private chats: optional scheme, then at least three characters that are
/// neither whitespace nor CJK ideographs (links pasted inside Chinese text).
fn private_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:https?)?://[^\x{4e00}-\x{9fa5}\n\r\s]{3,}").expect("valid regex")
    })
}

/// Groups: only explicit http(s) links, so casual chat is not probed.
fn group_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid regex"))
}

/// Links found in a plain (non-command) message, in order of appearance.
pub fn links_in_message(kind: ChatKind, text: &str) -> Vec<String> {
    let re = match kind {
        ChatKind::Private => private_link_re(),
        ChatKind::Group | ChatKind::Supergroup => group_link_re(),
        ChatKind::Channel => return Vec::new(),
    };
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Arguments of `/get` that look like http(s) links.
pub fn links_in_get_args(args: &str) -> Vec<String> {
    args.split_whitespace()
        .filter(|a| a.starts_with("http://") || a.starts_with("https://"))
        .map(|a| a.to_string())
        .collect()
}
