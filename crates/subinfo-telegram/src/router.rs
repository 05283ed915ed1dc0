use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use subinfo_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use subinfo_core::{
    cleanup::DeletionScheduler, config::Config, messaging::port::MessagingPort,
    ports::SubscriptionFetcher, query::QueryService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub queries: Arc<QueryService>,
    pub deletions: DeletionScheduler,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    fetcher: Arc<dyn SubscriptionFetcher>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Fail fast on a bad token instead of polling forever.
    let me = bot.get_me().await?;
    tracing::info!(
        username = %me.username(),
        max_concurrent = cfg.max_concurrent_queries,
        fetch_timeout_ms = cfg.fetch_timeout.as_millis() as u64,
        "subinfo bot started"
    );

    // One message can carry many links; throttle the resulting fan-out to
    // stay under flood limits. The adapter still retries once on RetryAfter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));
    let deletions = DeletionScheduler::new(messenger.clone());
    let queries = Arc::new(QueryService::new(
        fetcher,
        messenger.clone(),
        deletions.clone(),
        cfg.query_settings(),
    ));

    let state = Arc::new(AppState {
        cfg,
        messenger,
        queries,
        deletions: deletions.clone(),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    deletions.shutdown();
    tracing::info!("subinfo bot stopped");
    Ok(())
}
