//! Latest-quote store: a keyed cache holding one quote per symbol plus
//! global feed metadata (active mode and a last-update marker).
//!
//! Two implementations exist: [`MemoryQuoteStore`] for single-process use
//! (state resets on restart) and [`RedisQuoteStore`] when the cache must be
//! shared across processes or survive a restart.

pub mod memory;
pub mod redis;

pub use memory::MemoryQuoteStore;
pub use redis::RedisQuoteStore;

use crate::types::{FeedMode, Quote};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Keyed latest-quote cache. Absence of a symbol means "never yet
/// received"; entries are overwritten, never expired or deleted.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Upsert the quote for its symbol and bump the last-update marker.
    async fn set(&self, quote: Quote) -> Result<()>;

    /// Latest quotes for the requested symbols, request order preserved.
    /// Symbols with no cached value are silently omitted.
    async fn get(&self, symbols: &[String]) -> Result<Vec<Quote>>;

    /// Record which producer is feeding the store.
    async fn set_mode(&self, mode: FeedMode) -> Result<()>;

    async fn mode(&self) -> Result<FeedMode>;

    /// Timestamp of the most recent write, regardless of symbol.
    async fn last_update(&self) -> Result<Option<DateTime<Utc>>>;
}
