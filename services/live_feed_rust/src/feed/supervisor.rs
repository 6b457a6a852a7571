//! Feed supervisor: selects the active producer at startup and owns its
//! session lifecycle and reconnection policy.

use crate::config::FeedServiceConfig;
use crate::feed::synthetic::SyntheticFeed;
use crate::feed::upstream::UpstreamFeed;
use crate::feed::FeedSource;
use log::{error, info, warn};
use quote_core::QuoteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub struct FeedSupervisor {
    source: Box<dyn FeedSource>,
    reconnect_delay: Duration,
}

impl FeedSupervisor {
    pub fn new(source: Box<dyn FeedSource>, reconnect_delay: Duration) -> Self {
        Self {
            source,
            reconnect_delay,
        }
    }

    /// Strategy selection: a configured upstream credential selects the
    /// live feed, otherwise the synthetic generator. Exactly one producer
    /// exists per supervisor, so producers never overlap.
    pub fn from_config(config: &FeedServiceConfig, store: Arc<dyn QuoteStore>) -> Self {
        let source: Box<dyn FeedSource> = match &config.finnhub_api_key {
            Some(api_key) => {
                info!("Upstream credential configured, selecting live feed");
                Box::new(UpstreamFeed::new(
                    store,
                    config.symbols.clone(),
                    config.finnhub_ws_url.clone(),
                    api_key.clone(),
                ))
            }
            None => {
                info!("No upstream credential, selecting synthetic feed");
                Box::new(SyntheticFeed::new(
                    store,
                    config.symbols.clone(),
                    config.tick_interval,
                ))
            }
        };
        Self::new(source, config.reconnect_delay)
    }

    /// Run the producer, restarting it after the fixed delay whenever a
    /// session ends. No backoff growth, no retry cap: connectivity loss is
    /// treated as recoverable indefinitely. Loops until the owning task is
    /// aborted at shutdown.
    pub async fn run(mut self) {
        loop {
            match self.source.run().await {
                Ok(()) => warn!("{:?} feed session ended", self.source.mode()),
                Err(e) => error!("{:?} feed session failed: {}", self.source.mode(), e),
            }
            sleep(self.reconnect_delay).await;
            info!("Restarting {:?} feed", self.source.mode());
        }
    }
}
