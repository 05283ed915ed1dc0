use teloxide::prelude::*;

use subinfo_core::{
    domain::{ChatKind, QueryOrigin},
    links::links_in_get_args,
};

use crate::router::AppState;

use super::send_notice;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = "🌈 Welcome to the subscription info bot!\n\n\
📖 <b>Commands:</b>\n\
/start - Show this help message\n\
/get &lt;link&gt; [link...] - Look up subscription links\n\
/about - About this bot\n\
/version - Show version\n\n\
Or just send me a message containing subscription links.";

const INVALID_ARGUMENTS: &str =
    "❌ Invalid arguments, usage: <code>/get &lt;link&gt; [link...]</code>";
const NO_VALID_LINK: &str = "❌ No valid subscription link found, please check and try again";

fn commit_id() -> &'static str {
    option_env!("SUBINFO_COMMIT").unwrap_or("unknown")
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Reply(String),
    Notice(&'static str),
    Query(Vec<String>),
    Ignore,
}

fn route_command(cmd: &str, args: &str, kind: ChatKind) -> Action {
    let private = kind == ChatKind::Private;
    match cmd {
        "start" if private => Action::Reply(HELP.to_string()),
        "version" if private => Action::Reply(format!(
            "<b>Subinfo Bot</b>\n\n<b>Version:</b> <code>{VERSION}</code>\n\
             <b>Commit:</b> <code>{}</code>",
            commit_id()
        )),
        "about" => Action::Reply(format!(
            "<b>Subinfo Bot {VERSION}</b>\n\n\
Reports traffic usage and expiry of proxy subscription links, read from the \
provider's <code>Subscription-Userinfo</code> header. The subscription \
content itself is never downloaded or stored."
        )),
        "get" => {
            if args.is_empty() {
                return Action::Notice(INVALID_ARGUMENTS);
            }
            let links = links_in_get_args(args);
            if links.is_empty() {
                Action::Notice(NO_VALID_LINK)
            } else {
                Action::Query(links)
            }
        }
        _ => Action::Ignore,
    }
}

pub async fn handle_command(
    state: &AppState,
    origin: QueryOrigin,
    text: &str,
) -> ResponseResult<()> {
    let (cmd, args) = parse_command(text);

    match route_command(&cmd, &args, origin.kind) {
        Action::Reply(html) => {
            if let Err(e) = state.messenger.send_html(origin.chat_id, &html, None).await {
                tracing::warn!(
                    chat_id = origin.chat_id.0,
                    command = %cmd,
                    error = %e,
                    "command reply failed"
                );
            }
        }
        Action::Notice(html) => send_notice(state, origin, html).await,
        Action::Query(links) => {
            tracing::info!(chat_id = origin.chat_id.0, links = links.len(), "/get");
            state.queries.spawn_all(origin, links);
        }
        Action::Ignore => {}
    }
    Ok(())
}
