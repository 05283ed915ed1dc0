//! Hand-written fakes for the core ports, shared by unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::{port::MessagingPort, types::MessagingCapabilities},
    ports::{FetchedResponse, SubscriptionFetcher},
    Error, Result,
};

/// Messenger fake that records every call.
#[derive(Default)]
pub(crate) struct RecordingMessenger {
    sent: Mutex<Vec<(ChatId, String, Option<MessageId>)>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
    deleted: Mutex<Vec<MessageRef>>,
    no_edit: bool,
    fail_edit: bool,
}

impl RecordingMessenger {
    pub fn without_edit() -> Self {
        Self {
            no_edit: true,
            ..Self::default()
        }
    }

    /// Edits are advertised but every call fails.
    pub fn failing_edits() -> Self {
        Self {
            fail_edit: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String, Option<MessageId>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities { supports_edit: !self.no_edit }
    }

    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, html.to_string(), reply_to));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(1000 + sent.len() as i32),
        })
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        if self.fail_edit {
            return Err(Error::External("telegram error: message to edit not found".into()));
        }
        self.edits.lock().unwrap().push((msg, html.to_string()));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.deleted.lock().unwrap().push(msg);
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) enum Canned {
    Response {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
    },
    Transport(&'static str),
}

/// Fetcher fake answering from a per-link table, with optional latency.
/// Tracks the peak number of concurrent fetches.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    table: HashMap<String, Canned>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn with(mut self, link: &str, canned: Canned) -> Self {
        self.table.insert(link.to_string(), canned);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionFetcher for FakeFetcher {
    async fn fetch(&self, link: &str) -> Result<FetchedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.table.get(link) {
            Some(Canned::Response { status, headers }) => {
                let mut map = HeaderMap::new();
                for &(k, v) in headers {
                    map.append(HeaderName::from_static(k), HeaderValue::from_static(v));
                }
                Ok(FetchedResponse {
                    status: *status,
                    headers: map,
                })
            }
            Some(Canned::Transport(msg)) => Err(Error::Transport(msg.to_string())),
            None => Err(Error::Transport(format!("no route to {link}"))),
        }
    }
}
