//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - maps the teloxide message into core types
//! - decides which links to query (or which notice to send)
//! - hands the links to the core query service

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Chat, Message},
};

use subinfo_core::domain::{ChatId, ChatKind, MessageId, QueryOrigin};

use crate::router::AppState;
mod commands;
mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let origin = QueryOrigin {
        chat_id: ChatId(msg.chat.id.0),
        kind: chat_kind(&msg.chat),
        reply_to: MessageId(msg.id.0),
    };

    if text.starts_with('/') {
        return commands::handle_command(&state, origin, text).await;
    }

    let from_channel = msg
        .sender_chat()
        .as_ref()
        .is_some_and(|c| c.is_channel());
    text::handle_text(&state, origin, text, from_channel).await
}

fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    }
}

/// Reply to the user's message. In groups the notice is removed after
/// `group_notice_ttl` so it does not clutter the chat.
async fn send_notice(state: &AppState, origin: QueryOrigin, html: &str) {
    match state
        .messenger
        .send_html(origin.chat_id, html, Some(origin.reply_to))
        .await
    {
        Ok(sent) => {
            if origin.kind.is_group() {
                state.deletions.schedule(sent, state.cfg.group_notice_ttl);
            }
        }
        Err(e) => {
            tracing::warn!(chat_id = origin.chat_id.0, error = %e, "failed to send notice");
        }
    }
}
