use std::sync::Arc;

use subinfo_core::{config::Config, fetch::HttpFetcher, ports::SubscriptionFetcher};

#[tokio::main]
async fn main() -> Result<(), subinfo_core::Error> {
    subinfo_core::logging::init("subinfo")?;

    let cfg = Arc::new(Config::load()?);
    let fetcher: Arc<dyn SubscriptionFetcher> =
        Arc::new(HttpFetcher::new(&cfg.user_agent, cfg.fetch_timeout)?);
    tracing::debug!(user_agent = %cfg.user_agent, "http fetcher ready");

    subinfo_telegram::router::run_polling(cfg, fetcher)
        .await
        .map_err(|e| subinfo_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
