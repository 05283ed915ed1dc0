use teloxide::prelude::*;

use subinfo_core::{
    domain::{ChatKind, QueryOrigin},
    links::links_in_message,
};

use crate::router::AppState;

use super::send_notice;

const NOTHING_FOUND: &str = "❌ Couldn't find any link in your message!";

/// Plain text: private chats always get an answer, groups are queried
/// silently and only for messages sent by users.
pub async fn handle_text(
    state: &AppState,
    origin: QueryOrigin,
    text: &str,
    from_channel: bool,
) -> ResponseResult<()> {
    match origin.kind {
        ChatKind::Private => {
            let links = links_in_message(origin.kind, text);
            if links.is_empty() {
                send_notice(state, origin, NOTHING_FOUND).await;
                return Ok(());
            }
            tracing::info!(chat_id = origin.chat_id.0, links = links.len(), "private query");
            state.queries.spawn_all(origin, links);
        }
        ChatKind::Group | ChatKind::Supergroup => {
            if from_channel {
                return Ok(());
            }
            let links = links_in_message(origin.kind, text);
            if !links.is_empty() {
                tracing::info!(chat_id = origin.chat_id.0, links = links.len(), "group query");
                state.queries.spawn_all(origin, links);
            }
        }
        ChatKind::Channel => {}
    }
    Ok(())
}
