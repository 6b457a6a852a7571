//! Configuration for live_feed_rust

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

/// Default tracked universe: a broad equal-weight ETF basket.
pub const DEFAULT_SYMBOLS: &str = "SPY,QQQ,IWM,EFA,EEM,AGG,GLD,VNQ,TLT,LQD";

const DEFAULT_WS_URL: &str = "wss://ws.finnhub.io";

#[derive(Debug, Clone)]
pub struct FeedServiceConfig {
    // Upstream venue; no API key means synthetic mode
    pub finnhub_api_key: Option<String>,
    pub finnhub_ws_url: String,

    // Symbol universe, ordered and immutable for the process lifetime
    pub symbols: Vec<String>,

    // Store connection target; unset means in-memory
    pub redis_url: Option<String>,

    // Timing
    pub tick_interval: Duration,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
}

impl FeedServiceConfig {
    pub fn from_env() -> Result<Self> {
        let tick_secs = parse_u64("FEED_TICK_INTERVAL_SECS", 3)?;
        let reconnect_secs = parse_u64("FEED_RECONNECT_DELAY_SECS", 5)?;
        let poll_secs = parse_u64("POLL_INTERVAL_SECS", 5)?;

        if tick_secs == 0 {
            return Err(anyhow!("FEED_TICK_INTERVAL_SECS must be >= 1"));
        }
        if reconnect_secs == 0 {
            return Err(anyhow!("FEED_RECONNECT_DELAY_SECS must be >= 1"));
        }
        if poll_secs == 0 {
            return Err(anyhow!("POLL_INTERVAL_SECS must be >= 1"));
        }

        let symbols = parse_symbol_list(
            &env::var("LIVE_SYMBOLS").unwrap_or_else(|_| DEFAULT_SYMBOLS.to_string()),
        );
        if symbols.is_empty() {
            return Err(anyhow!("LIVE_SYMBOLS must contain at least one symbol"));
        }

        Ok(Self {
            finnhub_api_key: env::var("FINNHUB_API_KEY").ok().filter(|k| !k.is_empty()),

            finnhub_ws_url: env::var("FINNHUB_WS_URL")
                .unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),

            symbols,

            redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),

            tick_interval: Duration::from_secs(tick_secs),
            reconnect_delay: Duration::from_secs(reconnect_secs),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

/// Parse a comma-delimited symbol list: entries trimmed, upper-cased,
/// empties dropped. Order is preserved.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}
