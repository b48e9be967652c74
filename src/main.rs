//! tg-auto-channels — Binary Entrypoint
//! Wires configuration, capability clients and the posting scheduler, then
//! runs until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tg_auto_channels::ai::{ChatClient, OpenAiChatClient};
use tg_auto_channels::config::{self, Settings};
use tg_auto_channels::content;
use tg_auto_channels::feeds::FeedAggregator;
use tg_auto_channels::images::{ImageClient, OpenAiImageClient};
use tg_auto_channels::posting::policy::PostingPolicy;
use tg_auto_channels::posting::scheduler::{spawn_posting_scheduler, SchedulerService};
use tg_auto_channels::posting::service::PostingService;
use tg_auto_channels::store::MemoryStore;
use tg_auto_channels::telegram::TelegramPublisher;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tg_auto_channels=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env().context("loading settings")?;
    let channels = config::load_channels_default().context("loading channel config")?;
    tracing::info!(channels = channels.len(), "loaded channel configuration");

    let store = Arc::new(MemoryStore::new());
    store.seed_channels(channels);

    let aggregator = Arc::new(FeedAggregator::new(
        Duration::from_secs(settings.feed_request_timeout_secs),
        settings.max_entries_per_source,
    ));

    let chat: Option<Arc<dyn ChatClient>> = settings
        .openai_api_key
        .clone()
        .map(|key| Arc::new(OpenAiChatClient::new(key, None)) as Arc<dyn ChatClient>);
    let images: Option<Arc<dyn ImageClient>> = settings
        .openai_api_key
        .clone()
        .map(|key| Arc::new(OpenAiImageClient::new(key)) as Arc<dyn ImageClient>);
    if chat.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; only the placeholder strategy is available");
    }

    let registry = Arc::new(content::build_registry(&settings, chat, aggregator));
    let publisher = Arc::new(TelegramPublisher::new(settings.telegram_bot_token.clone()));

    let posting = PostingService::new(
        registry,
        store.clone(),
        publisher,
        images,
        settings.history_scan_limit,
    );
    let policy = PostingPolicy::new(store.clone());
    let scheduler = Arc::new(SchedulerService::new(store.clone(), policy, posting));

    let handle = spawn_posting_scheduler(
        scheduler,
        Duration::from_secs(settings.posting_interval_minutes.max(1) * 60),
    );
    tracing::info!(
        interval_minutes = settings.posting_interval_minutes,
        "posting scheduler started"
    );

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutdown requested");
    handle.abort();
    Ok(())
}
