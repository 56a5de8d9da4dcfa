use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsbot::bot::{BotConfig, BotHandler, TelegramClient, COMMAND_DESCRIPTIONS};
use newsbot::cache::{CacheConfig, CacheManager};
use newsbot::news::{CachedNews, NewsApiClient, NewsApiConfig};
use newsbot::services::{
    CacheCleanupJob, DigestScheduler, DigestSchedulerConfig, InterestStore, SubscriptionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting news bot...");

    let cache_config = CacheConfig::from_env();
    info!(
        "Cache: {} (ttl {}s, capacity {})",
        cache_config.path.display(),
        cache_config.ttl.as_secs(),
        cache_config.capacity
    );
    let cleanup_interval = cache_config.cleanup_interval;
    let cache = Arc::new(CacheManager::with_file_store(cache_config));

    let news_config = NewsApiConfig::from_env()?;
    let country = news_config.country.clone();
    let provider = Arc::new(NewsApiClient::new(news_config)?);
    let news = CachedNews::new(cache.clone(), provider).with_country(&country);

    let bot_config = BotConfig::from_env()?;
    let subscriptions = Arc::new(SubscriptionStore::new(&bot_config.subscriptions_path));
    let interests = Arc::new(InterestStore::new(&bot_config.interests_path));

    let telegram = Arc::new(TelegramClient::new(bot_config).context("Failed to build Telegram client")?);
    if let Err(e) = telegram.set_my_commands(COMMAND_DESCRIPTIONS).await {
        warn!("Failed to register bot commands (non-fatal): {}", e);
    }

    let digest_config = DigestSchedulerConfig::from_env();
    if digest_config.enabled {
        let hour = digest_config.delivery_hour;
        let scheduler = Arc::new(DigestScheduler::new(
            digest_config,
            news.clone(),
            subscriptions.clone(),
            telegram.clone(),
        ));
        let _digest_handle = scheduler.start();
        info!("📬 Daily digest enabled (delivery at {:02}:00)", hour);
    } else {
        info!("Daily digest disabled (set DIGEST_ENABLED=true to enable)");
    }

    match cleanup_interval {
        Some(interval) => {
            let _cleanup_handle = CacheCleanupJob::new(cache.clone(), interval).start();
        }
        None => info!("Cache cleanup job disabled"),
    }

    let handler = Arc::new(BotHandler::new(news, subscriptions, interests));

    tokio::select! {
        result = telegram.clone().run_polling(handler) => {
            if let Err(e) = result {
                error!("Polling stopped: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_signal() => {}
    }

    info!("News bot shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received...");
}
