//! Synthetic quote generator.
//!
//! Provides a usable feed when no upstream credential is configured, so
//! consumers never observe an empty cache. Each symbol follows a bounded
//! random walk seeded from its position in the universe. Selected only at
//! startup; never a fallback after a live failure.

use crate::feed::FeedSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use quote_core::{FeedMode, Quote, QuoteSource, QuoteStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Price floor: synthetic quotes never drift below this.
const PRICE_FLOOR: f64 = 1.0;

pub struct SyntheticFeed {
    store: Arc<dyn QuoteStore>,
    symbols: Vec<String>,
    tick_interval: Duration,
    prices: HashMap<String, f64>,
}

impl SyntheticFeed {
    pub fn new(store: Arc<dyn QuoteStore>, symbols: Vec<String>, tick_interval: Duration) -> Self {
        let prices = symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (symbol.clone(), seed_price(index)))
            .collect();
        Self {
            store,
            symbols,
            tick_interval,
            prices,
        }
    }

    /// Advance every symbol one step and write the results to the store.
    pub async fn tick(&mut self) -> Result<()> {
        let now = Utc::now();
        for symbol in &self.symbols {
            let prev = self.prices.get(symbol).copied().unwrap_or(100.0);
            let next = step_price(prev, random_drift());
            self.prices.insert(symbol.clone(), next);
            self.store
                .set(Quote {
                    symbol: symbol.clone(),
                    price: next,
                    timestamp: now,
                    source: QuoteSource::Synthetic,
                })
                .await
                .context("failed to store synthetic quote")?;
        }
        Ok(())
    }
}

#[async_trait]
impl FeedSource for SyntheticFeed {
    fn mode(&self) -> FeedMode {
        FeedMode::Synthetic
    }

    /// Tick for the life of the process; only a store failure returns.
    async fn run(&mut self) -> Result<()> {
        let mut ticker = interval(self.tick_interval);
        ticker.tick().await;

        self.store
            .set_mode(FeedMode::Synthetic)
            .await
            .context("failed to record synthetic feed mode")?;
        info!(
            "Synthetic feed started for {} symbols at {:?} intervals",
            self.symbols.len(),
            self.tick_interval
        );

        loop {
            self.tick().await?;
            ticker.tick().await;
        }
    }
}

/// Base price for the symbol at `index`: 80 + 15 per slot plus up to 10 of
/// noise, so the universe fans out across distinct price bands.
fn seed_price(index: usize) -> f64 {
    80.0 + 15.0 * index as f64 + rand::random::<f64>() * 10.0
}

/// One random-walk step: bounded drift, floored, rounded to cents.
fn step_price(prev: f64, drift: f64) -> f64 {
    let next = (prev + drift).max(PRICE_FLOOR);
    (next * 100.0).round() / 100.0
}

/// Uniform drift in [-0.4, 0.4).
fn random_drift() -> f64 {
    (rand::random::<f64>() - 0.5) * 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_core::MemoryQuoteStore;

    fn universe(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seed_prices_fan_out_by_index() {
        for index in 0..10 {
            let seed = seed_price(index);
            let base = 80.0 + 15.0 * index as f64;
            assert!(seed >= base && seed < base + 10.0, "seed {} out of band", seed);
        }
    }

    #[test]
    fn test_step_price_never_falls_below_floor() {
        let mut price = 1.2;
        for _ in 0..100 {
            price = step_price(price, -0.4);
            assert!(price >= PRICE_FLOOR);
        }
        assert_eq!(step_price(1.0, -0.4), 1.0);
    }

    #[test]
    fn test_step_price_rounds_to_cents() {
        let stepped = step_price(100.0, 0.123456);
        assert_eq!(stepped, 100.12);
    }

    #[test]
    fn test_random_drift_is_bounded() {
        for _ in 0..1000 {
            let drift = random_drift();
            assert!((-0.4..0.4).contains(&drift));
        }
    }

    #[tokio::test]
    async fn test_tick_writes_every_symbol_as_synthetic() {
        let store = Arc::new(MemoryQuoteStore::new());
        let symbols = universe(&["SPY", "QQQ", "IWM"]);
        let mut feed = SyntheticFeed::new(store.clone(), symbols.clone(), Duration::from_secs(3));

        feed.tick().await.unwrap();

        let quotes = store.get(&symbols).await.unwrap();
        assert_eq!(quotes.len(), 3);
        for quote in &quotes {
            assert_eq!(quote.source, QuoteSource::Synthetic);
            assert!(quote.price >= PRICE_FLOOR);
        }
        assert!(store.last_update().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_sets_mode_and_populates_store() {
        let store = Arc::new(MemoryQuoteStore::new());
        let symbols = universe(&["SPY", "QQQ"]);
        let mut feed = SyntheticFeed::new(store.clone(), symbols.clone(), Duration::from_millis(10));

        let task = tokio::spawn(async move { feed.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(store.mode().await.unwrap(), FeedMode::Synthetic);
        let quotes = store.get(&symbols).await.unwrap();
        assert_eq!(quotes.len(), 2);
    }

    #[tokio::test]
    async fn test_successive_ticks_overwrite_quotes() {
        let store = Arc::new(MemoryQuoteStore::new());
        let symbols = universe(&["SPY"]);
        let mut feed = SyntheticFeed::new(store.clone(), symbols.clone(), Duration::from_secs(3));

        feed.tick().await.unwrap();
        feed.tick().await.unwrap();

        // Still exactly one entry per symbol.
        let quotes = store.get(&symbols).await.unwrap();
        assert_eq!(quotes.len(), 1);
    }
}
