//! Subscription query service: fetch, classify and answer in chat.
//!
//! Each detected link becomes one independent task. Fetches share a bounded
//! pool so a message pasting dozens of links cannot open dozens of upstream
//! connections at once.

use std::{sync::Arc, time::Duration};

use chrono::{FixedOffset, Utc};
use tokio::{sync::Semaphore, task::JoinHandle};

use crate::{
    cleanup::DeletionScheduler,
    domain::{MessageRef, QueryOrigin},
    messaging::port::MessagingPort,
    ports::SubscriptionFetcher,
    render::{render_failure, render_report, FETCHING_PLACEHOLDER},
    subscription::{classify, extract_facts, UsageReport},
    Error, Result,
};

#[derive(Clone, Debug)]
pub struct QuerySettings {
    pub fetch_timeout: Duration,
    pub max_concurrent: usize,
    /// Reports in group chats are deleted after this long.
    pub group_report_ttl: Duration,
    pub display_offset: FixedOffset,
    pub footer: Option<String>,
}

pub struct QueryService {
    fetcher: Arc<dyn SubscriptionFetcher>,
    messenger: Arc<dyn MessagingPort>,
    deletions: DeletionScheduler,
    permits: Arc<Semaphore>,
    settings: QuerySettings,
}

impl QueryService {
    pub fn new(
        fetcher: Arc<dyn SubscriptionFetcher>,
        messenger: Arc<dyn MessagingPort>,
        deletions: DeletionScheduler,
        settings: QuerySettings,
    ) -> Self {
        Self {
            fetcher,
            messenger,
            deletions,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            settings,
        }
    }

    /// Fetch and classify one link. Does not touch the chat.
    pub async fn query(&self, link: &str) -> Result<UsageReport> {
        let timeout = self.settings.fetch_timeout;
        let resp = tokio::time::timeout(timeout, self.fetcher.fetch(link))
            .await
            .map_err(|_| {
                Error::Transport(format!("timed out after {}s", timeout.as_secs_f32()))
            })??;

        let facts = extract_facts(link, resp.status, &resp.headers)?;
        let now = Utc::now().with_timezone(&self.settings.display_offset);
        let report = classify(facts, now);

        tracing::info!(
            link,
            status = resp.status,
            verdict = ?report.verdict,
            "subscription classified"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(&report) {
                Ok(json) => tracing::debug!(link, report = %json, "usage report"),
                Err(e) => tracing::debug!(link, error = %e, "usage report not serializable"),
            }
        }

        Ok(report)
    }

    /// Answer one link in chat: placeholder first, then the report (or the
    /// failure) in its place. Returns the message holding the final answer.
    pub async fn respond(&self, origin: QueryOrigin, link: &str) -> Result<MessageRef> {
        let placeholder = self
            .messenger
            .send_html(origin.chat_id, FETCHING_PLACEHOLDER, Some(origin.reply_to))
            .await?;

        let outcome = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| Error::External(format!("query pool closed: {e}")))?;
            self.query(link).await
        };

        let html = match &outcome {
            Ok(report) => render_report(report, self.settings.footer.as_deref()),
            Err(e) => {
                tracing::warn!(link, error = %e, "subscription query failed");
                render_failure(link, e)
            }
        };

        let group = origin.kind.is_group();
        if self.messenger.capabilities().supports_edit {
            let edited = self.messenger.edit_html(placeholder, &html).await;
            // A failed edit still leaves the placeholder in the group.
            if group {
                self.deletions.schedule(placeholder, self.settings.group_report_ttl);
            }
            edited?;
            return Ok(placeholder);
        }

        // No edit support: answer separately and drop the placeholder now.
        let sent = self
            .messenger
            .send_html(origin.chat_id, &html, Some(origin.reply_to))
            .await;
        if let Err(e) = self.messenger.delete_message(placeholder).await {
            tracing::warn!(link, error = %e, "failed to remove placeholder");
            if group {
                self.deletions.schedule(placeholder, self.settings.group_report_ttl);
            }
        }
        let answer = sent?;
        if group {
            self.deletions.schedule(answer, self.settings.group_report_ttl);
        }
        Ok(answer)
    }

    /// Spawn one [`respond`](Self::respond) task per link.
    pub fn spawn_all(
        self: &Arc<Self>,
        origin: QueryOrigin,
        links: Vec<String>,
    ) -> Vec<JoinHandle<()>> {
        links
            .into_iter()
            .map(|link| {
                let svc = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) = svc.respond(origin, &link).await {
                        tracing::error!(
                            link = %link,
                            chat_id = origin.chat_id.0,
                            error = %e,
                            "failed to answer query"
                        );
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, ChatKind, MessageId},
        testing::{Canned, FakeFetcher, RecordingMessenger},
    };

    const LINK: &str = "https://sub.example.com/api/v1/client/subscribe?token=abc";

    fn settings() -> QuerySettings {
        QuerySettings {
            fetch_timeout: Duration::from_secs(5),
            max_concurrent: 4,
            group_report_ttl: Duration::from_millis(20),
            display_offset: FixedOffset::east_opt(8 * 3600).unwrap(),
            footer: None,
        }
    }

    fn origin(kind: ChatKind) -> QueryOrigin {
        QueryOrigin {
            chat_id: ChatId(42),
            kind,
            reply_to: MessageId(5),
        }
    }

    /// The first message the fake messenger hands out.
    fn placeholder_ref() -> MessageRef {
        MessageRef {
            chat_id: ChatId(42),
            message_id: MessageId(1001),
        }
    }

    fn ok_response() -> Canned {
        Canned::Response {
            status: 200,
            headers: vec![
                ("subscription-userinfo", "upload=0; download=0; total=1073741824"),
                ("content-disposition", "attachment; filename=Cloud.yaml"),
            ],
        }
    }

    fn service(
        fetcher: FakeFetcher,
        messenger: Arc<RecordingMessenger>,
        settings: QuerySettings,
    ) -> Arc<QueryService> {
        let deletions = DeletionScheduler::new(messenger.clone());
        Arc::new(QueryService::new(
            Arc::new(fetcher),
            messenger,
            deletions,
            settings,
        ))
    }

    #[tokio::test]
    async fn query_classifies_response() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = service(FakeFetcher::default().with(LINK, ok_response()), messenger, settings());

        let report = svc.query(LINK).await.unwrap();
        assert_eq!(report.facts.display_name, "Cloud");
        assert_eq!(report.remaining_display, "1.00 GB");
        assert_eq!(report.verdict, crate::subscription::Verdict::Valid);
    }

    #[tokio::test]
    async fn respond_replaces_placeholder_with_report() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        let answer = svc.respond(origin(ChatKind::Private), LINK).await.unwrap();

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, FETCHING_PLACEHOLDER);
        assert_eq!(sent[0].2, Some(MessageId(5)));

        let edits = messenger.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, answer);
        assert!(edits[0].1.contains("This subscription is valid"));
        assert!(edits[0].1.contains("Cloud"));
    }

    #[tokio::test]
    async fn failures_are_rendered_in_chat() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fetcher = FakeFetcher::default().with(
            LINK,
            Canned::Response {
                status: 200,
                headers: vec![],
            },
        );
        let svc = service(fetcher, messenger.clone(), settings());

        svc.respond(origin(ChatKind::Private), LINK).await.unwrap();

        let edits = messenger.edits();
        assert!(edits[0].1.contains("Query failed"));
        assert!(edits[0].1.contains("no usage info returned"));
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fetcher = FakeFetcher::default()
            .with(LINK, ok_response())
            .delayed(Duration::from_secs(2));
        let svc = service(
            fetcher,
            messenger,
            QuerySettings {
                fetch_timeout: Duration::from_millis(30),
                ..settings()
            },
        );

        match svc.query(LINK).await {
            Err(Error::Transport(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sends_new_message_when_edit_is_unsupported() {
        let messenger = Arc::new(RecordingMessenger::without_edit());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        let answer = svc.respond(origin(ChatKind::Private), LINK).await.unwrap();

        assert!(messenger.edits().is_empty());
        let sent = messenger.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].1.contains("This subscription is valid"));
        assert_eq!(answer.message_id, MessageId(1002));
        // The placeholder is removed right away, even in private chats.
        assert_eq!(messenger.deleted(), vec![placeholder_ref()]);
    }

    #[tokio::test]
    async fn group_without_edit_cleans_up_placeholder_and_answer() {
        let messenger = Arc::new(RecordingMessenger::without_edit());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        let answer = svc.respond(origin(ChatKind::Supergroup), LINK).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let deleted = messenger.deleted();
        assert!(deleted.contains(&placeholder_ref()));
        assert!(deleted.contains(&answer));
        assert_eq!(deleted.len(), 2);
    }

    #[tokio::test]
    async fn failed_edit_in_group_still_deletes_placeholder() {
        let messenger = Arc::new(RecordingMessenger::failing_edits());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        let result = svc.respond(origin(ChatKind::Supergroup), LINK).await;
        assert!(matches!(result, Err(Error::External(_))));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(messenger.deleted(), vec![placeholder_ref()]);
    }

    #[tokio::test]
    async fn failed_edit_in_private_chat_is_reported() {
        let messenger = Arc::new(RecordingMessenger::failing_edits());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        assert!(svc.respond(origin(ChatKind::Private), LINK).await.is_err());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(messenger.deleted().is_empty());
    }

    #[tokio::test]
    async fn transport_failures_are_rendered_in_chat() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fetcher =
            FakeFetcher::default().with(LINK, Canned::Transport("connection refused"));
        let svc = service(fetcher, messenger.clone(), settings());

        let answer = svc.respond(origin(ChatKind::Private), LINK).await.unwrap();

        let edits = messenger.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, answer);
        assert!(edits[0].1.contains("Query failed"));
        assert!(edits[0].1.contains("request failed: connection refused"));
        assert!(edits[0].1.contains(LINK));
    }

    #[tokio::test]
    async fn group_reports_are_deleted_later() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        let answer = svc.respond(origin(ChatKind::Supergroup), LINK).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(messenger.deleted(), vec![answer]);
    }

    #[tokio::test]
    async fn private_reports_are_kept() {
        let messenger = Arc::new(RecordingMessenger::default());
        let svc = service(
            FakeFetcher::default().with(LINK, ok_response()),
            messenger.clone(),
            settings(),
        );

        svc.respond(origin(ChatKind::Private), LINK).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(messenger.deleted().is_empty());
    }

    #[tokio::test]
    async fn spawn_all_respects_pool_size() {
        let messenger = Arc::new(RecordingMessenger::default());
        let links: Vec<String> = (0..6).map(|i| format!("https://s{i}.example.com/")).collect();
        let fetcher = links
            .iter()
            .fold(FakeFetcher::default(), |f, l| f.with(l, ok_response()))
            .delayed(Duration::from_millis(40));
        let fetcher = Arc::new(fetcher);
        let svc = Arc::new(QueryService::new(
            fetcher.clone(),
            messenger.clone(),
            DeletionScheduler::new(messenger.clone()),
            QuerySettings {
                max_concurrent: 2,
                ..settings()
            },
        ));

        for handle in svc.spawn_all(origin(ChatKind::Private), links) {
            handle.await.unwrap();
        }

        assert_eq!(fetcher.calls(), 6);
        assert!(fetcher.peak_concurrency() <= 2);
        assert_eq!(messenger.edits().len(), 6);
    }
}
