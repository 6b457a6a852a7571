//! Read-only query service over the quote store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quote_core::{Quote, QuoteSource, QuoteStore};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot served to polling consumers. `quotes` omits any requested
/// symbol that has no cached value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbols: Vec<String>,
    pub mode: Option<QuoteSource>,
    pub last_updated: Option<DateTime<Utc>>,
    pub quotes: Vec<Quote>,
}

/// Answers "give me the latest quotes for these symbols" from the store.
/// Side-effect free; returns whatever is cached, even if stale.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn QuoteStore>,
    universe: Vec<String>,
}

impl QueryService {
    pub fn new(store: Arc<dyn QuoteStore>, universe: Vec<String>) -> Self {
        Self { store, universe }
    }

    /// Latest cached quotes for `symbols`, defaulting to the configured
    /// universe. Store unavailability surfaces as an error; callers need
    /// to know the cache is unreachable.
    pub async fn query(&self, symbols: Option<&[String]>) -> Result<QuoteSnapshot> {
        let symbols: Vec<String> = symbols.unwrap_or(&self.universe).to_vec();
        let quotes = self
            .store
            .get(&symbols)
            .await
            .context("quote store unreachable")?;
        let mode = self.store.mode().await?.as_source();
        let last_updated = self.store.last_update().await?;
        Ok(QuoteSnapshot {
            symbols,
            mode,
            last_updated,
            quotes,
        })
    }
}
