use anyhow::Result;
use dotenv::dotenv;
use live_feed_rust::{FeedServiceConfig, FeedSupervisor, QueryService, QuotePoller};
use log::info;
use quote_core::{MemoryQuoteStore, QuoteStore, RedisQuoteStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    info!("Starting live_feed_rust...");

    let config = FeedServiceConfig::from_env()?;

    // The store is constructed once here and injected everywhere.
    let store: Arc<dyn QuoteStore> = match &config.redis_url {
        Some(url) => {
            info!("Using redis quote store at {}", url);
            Arc::new(RedisQuoteStore::connect(url).await?)
        }
        None => {
            info!("REDIS_URL not set, using in-memory quote store (state resets on restart)");
            Arc::new(MemoryQuoteStore::new())
        }
    };

    let supervisor = FeedSupervisor::from_config(&config, store.clone());
    let feed_task = tokio::spawn(supervisor.run());

    let query = QueryService::new(store, config.symbols.clone());
    let poller = QuotePoller::start(query, config.symbols.clone(), config.poll_interval);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping poller and feed");
    poller.stop();
    feed_task.abort();

    Ok(())
}
