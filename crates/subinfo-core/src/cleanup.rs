//! Deferred deletion of bot messages.
//!
//! Group chats get their reports removed after a while. Deletions can be
//! scheduled days ahead, so they run in detached tasks that only hold the
//! messenger, never the query that produced the message.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{domain::MessageRef, messaging::port::MessagingPort};

#[derive(Clone)]
pub struct DeletionScheduler {
    messenger: Arc<dyn MessagingPort>,
    cancel: CancellationToken,
}

impl DeletionScheduler {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            messenger,
            cancel: CancellationToken::new(),
        }
    }

    /// Delete `msg` once `after` has elapsed. Failures are logged, not retried.
    pub fn schedule(&self, msg: MessageRef, after: Duration) -> JoinHandle<()> {
        let messenger = self.messenger.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        chat_id = msg.chat_id.0,
                        message_id = msg.message_id.0,
                        "pending deletion dropped"
                    );
                }
                _ = sleep(after) => {
                    if let Err(e) = messenger.delete_message(msg).await {
                        tracing::warn!(
                            chat_id = msg.chat_id.0,
                            message_id = msg.message_id.0,
                            error = %e,
                            "scheduled deletion failed"
                        );
                    }
                }
            }
        })
    }

    /// Drop every pending deletion (process shutdown).
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
