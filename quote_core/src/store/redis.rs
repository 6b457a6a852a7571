//! Redis-backed quote store.
//!
//! Quotes live in the hash `live:quotes` (symbol -> JSON payload); the feed
//! mode and last-update marker are plain string keys. State is shared
//! across processes and survives restarts. Any connectivity failure is
//! surfaced to the caller rather than swallowed.

use crate::store::QuoteStore;
use crate::types::{FeedMode, Quote};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use redis::{aio::Connection, AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::Mutex;

const QUOTE_HASH: &str = "live:quotes";
const UPDATED_AT_KEY: &str = "live:updated_at";
const MODE_KEY: &str = "live:mode";

#[derive(Clone)]
pub struct RedisQuoteStore {
    connection: Arc<Mutex<Connection>>,
}

impl RedisQuoteStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).context("invalid redis url")?;
        let connection = client
            .get_async_connection()
            .await
            .context("failed to connect to redis")?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

fn encode_quote(quote: &Quote) -> Result<String> {
    serde_json::to_string(quote).context("failed to encode quote")
}

/// Decode a stored payload; corrupt entries are logged and omitted rather
/// than fabricated.
fn decode_quote(symbol: &str, payload: &str) -> Option<Quote> {
    match serde_json::from_str(payload) {
        Ok(quote) => Some(quote),
        Err(e) => {
            warn!("Dropping undecodable stored quote for {}: {}", symbol, e);
            None
        }
    }
}

fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Dropping undecodable last-update marker: {}", e);
            None
        }
    }
}

#[async_trait]
impl QuoteStore for RedisQuoteStore {
    async fn set(&self, quote: Quote) -> Result<()> {
        let payload = encode_quote(&quote)?;
        let mut conn = self.connection.lock().await;
        conn.hset::<_, _, _, ()>(QUOTE_HASH, &quote.symbol, payload)
            .await
            .context("failed to write quote")?;
        conn.set::<_, _, ()>(UPDATED_AT_KEY, quote.timestamp.to_rfc3339())
            .await
            .context("failed to write last-update marker")?;
        Ok(())
    }

    async fn get(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection.lock().await;
        // HMGET keeps the reply aligned with the request order.
        let payloads: Vec<Option<String>> = if symbols.len() == 1 {
            vec![conn
                .hget(QUOTE_HASH, &symbols[0])
                .await
                .context("failed to read quotes")?]
        } else {
            conn.hget(QUOTE_HASH, symbols)
                .await
                .context("failed to read quotes")?
        };
        Ok(symbols
            .iter()
            .zip(payloads)
            .filter_map(|(symbol, payload)| {
                payload.and_then(|p| decode_quote(symbol, &p))
            })
            .collect())
    }

    async fn set_mode(&self, mode: FeedMode) -> Result<()> {
        // Unset is the absence of a mode; it is never persisted.
        let Some(label) = mode.label() else {
            return Ok(());
        };
        let mut conn = self.connection.lock().await;
        conn.set::<_, _, ()>(MODE_KEY, label)
            .await
            .context("failed to write feed mode")?;
        Ok(())
    }

    async fn mode(&self) -> Result<FeedMode> {
        let mut conn = self.connection.lock().await;
        let label: Option<String> = conn
            .get(MODE_KEY)
            .await
            .context("failed to read feed mode")?;
        Ok(label
            .map(|l| FeedMode::from_label(&l))
            .unwrap_or(FeedMode::Unset))
    }

    async fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = self.connection.lock().await;
        let raw: Option<String> = conn
            .get(UPDATED_AT_KEY)
            .await
            .context("failed to read last-update marker")?;
        Ok(raw.and_then(|r| decode_timestamp(&r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuoteSource;

    #[test]
    fn test_quote_payload_round_trip() {
        let quote = Quote {
            symbol: "SPY".to_string(),
            price: 512.3,
            timestamp: Utc::now(),
            source: QuoteSource::Live,
        };
        let payload = encode_quote(&quote).unwrap();
        let decoded = decode_quote("SPY", &payload).unwrap();
        assert_eq!(decoded, quote);
    }

    #[test]
    fn test_corrupt_payload_is_dropped() {
        assert!(decode_quote("SPY", "not json").is_none());
        assert!(decode_quote("SPY", "{\"symbol\":\"SPY\"}").is_none());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let decoded = decode_timestamp(&now.to_rfc3339()).unwrap();
        assert_eq!(decoded, now);
        assert!(decode_timestamp("yesterday").is_none());
    }
}
