//! In-memory quote store.
//!
//! Per-symbol atomicity comes from the map lock; readers never observe a
//! partially written quote. All state is lost on process restart.

use crate::store::QuoteStore;
use crate::types::{FeedMode, Quote};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct FeedMeta {
    mode: FeedMode,
    last_update: Option<DateTime<Utc>>,
}

/// Single-process quote cache backed by a `HashMap`.
#[derive(Clone, Default)]
pub struct MemoryQuoteStore {
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
    meta: Arc<RwLock<FeedMeta>>,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn set(&self, quote: Quote) -> Result<()> {
        let timestamp = quote.timestamp;
        {
            let mut quotes = self.quotes.write().await;
            quotes.insert(quote.symbol.clone(), quote);
        }
        let mut meta = self.meta.write().await;
        meta.last_update = Some(timestamp);
        Ok(())
    }

    async fn get(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        let quotes = self.quotes.read().await;
        Ok(symbols
            .iter()
            .filter_map(|symbol| quotes.get(symbol).cloned())
            .collect())
    }

    async fn set_mode(&self, mode: FeedMode) -> Result<()> {
        let mut meta = self.meta.write().await;
        meta.mode = mode;
        Ok(())
    }

    async fn mode(&self) -> Result<FeedMode> {
        let meta = self.meta.read().await;
        Ok(meta.mode)
    }

    async fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        let meta = self.meta.read().await;
        Ok(meta.last_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuoteSource;

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
            source: QuoteSource::Synthetic,
        }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_preserves_request_order_and_omits_missing() {
        let store = MemoryQuoteStore::new();
        store.set(quote("QQQ", 430.0)).await.unwrap();
        store.set(quote("SPY", 512.0)).await.unwrap();

        let result = store.get(&symbols(&["SPY", "IWM", "QQQ"])).await.unwrap();
        let names: Vec<&str> = result.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(names, vec!["SPY", "QQQ"]);
        assert!(result.len() <= 3);
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_quote() {
        let store = MemoryQuoteStore::new();
        store.set(quote("SPY", 500.0)).await.unwrap();
        store.set(quote("SPY", 501.5)).await.unwrap();

        let result = store.get(&symbols(&["SPY"])).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].price, 501.5);
    }

    #[tokio::test]
    async fn test_set_bumps_last_update_marker() {
        let store = MemoryQuoteStore::new();
        assert!(store.last_update().await.unwrap().is_none());

        let q = quote("SPY", 500.0);
        let ts = q.timestamp;
        store.set(q).await.unwrap();
        assert_eq!(store.last_update().await.unwrap(), Some(ts));
    }

    #[tokio::test]
    async fn test_mode_defaults_to_unset() {
        let store = MemoryQuoteStore::new();
        assert_eq!(store.mode().await.unwrap(), FeedMode::Unset);

        store.set_mode(FeedMode::Synthetic).await.unwrap();
        assert_eq!(store.mode().await.unwrap(), FeedMode::Synthetic);
    }

    #[tokio::test]
    async fn test_get_unknown_symbols_is_not_an_error() {
        let store = MemoryQuoteStore::new();
        let result = store.get(&symbols(&["XYZ"])).await.unwrap();
        assert!(result.is_empty());
    }
}
