//! Periodic consumer-side poller.
//!
//! Drives refresh for a presentation layer: polls the query service on a
//! fixed interval, captures a per-symbol baseline from the first non-empty
//! response, and derives an equal-weight aggregate return against it. Poll
//! failures are skipped silently; the previous state stays visible until
//! the next successful tick.

use crate::query::{QueryService, QuoteSnapshot};
use chrono::{DateTime, Utc};
use log::{debug, info};
use quote_core::{Quote, QuoteSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Latest polled view plus the derived baseline.
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    pub quotes: Vec<Quote>,
    pub mode: Option<QuoteSource>,
    pub last_updated: Option<DateTime<Utc>>,
    /// First observed price per symbol; captured once, never overwritten.
    pub baseline: HashMap<String, f64>,
    /// Equal-weight mean return against the baseline.
    pub aggregate_return: f64,
}

struct PollerInner {
    query: QueryService,
    symbols: Vec<String>,
    cancelled: AtomicBool,
    state: RwLock<PollerState>,
}

impl PollerInner {
    async fn poll_once(&self) {
        let snapshot = match self.query.query(Some(&self.symbols)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Stale data stays displayed until the next tick.
                debug!("Poll skipped: {}", e);
                return;
            }
        };
        // A response that raced a teardown must not land.
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        self.apply(snapshot).await;
    }

    async fn apply(&self, snapshot: QuoteSnapshot) {
        let mut state = self.state.write().await;
        if state.baseline.is_empty() {
            for quote in &snapshot.quotes {
                state.baseline.insert(quote.symbol.clone(), quote.price);
            }
        }
        let aggregate = aggregate_return(&snapshot.quotes, &state.baseline);
        state.aggregate_return = aggregate;
        state.quotes = snapshot.quotes;
        state.mode = snapshot.mode;
        state.last_updated = snapshot.last_updated;
        info!(
            "Tracking {} quotes (mode: {:?}, aggregate return: {:+.2}%)",
            state.quotes.len(),
            state.mode,
            state.aggregate_return * 100.0
        );
    }
}

/// Polling loop handle. Polls immediately at activation, then on every
/// interval tick, until [`stop`](Self::stop) is called.
pub struct QuotePoller {
    inner: Arc<PollerInner>,
    handle: JoinHandle<()>,
}

impl QuotePoller {
    pub fn start(query: QueryService, symbols: Vec<String>, poll_interval: Duration) -> Self {
        let inner = Arc::new(PollerInner {
            query,
            symbols,
            cancelled: AtomicBool::new(false),
            state: RwLock::new(PollerState::default()),
        });
        let loop_inner = inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                if loop_inner.cancelled.load(Ordering::SeqCst) {
                    break;
                }
                loop_inner.poll_once().await;
            }
        });
        Self { inner, handle }
    }

    pub async fn state(&self) -> PollerState {
        self.inner.state.read().await.clone()
    }

    /// Stop the loop. Nothing is applied after this returns: the
    /// cancellation flag is observed before any in-flight response lands,
    /// and the task is aborted so its timer is released.
    pub fn stop(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

/// Mean per-symbol return against the baseline. A symbol with no baseline
/// contributes zero: its baseline is its current price.
fn aggregate_return(quotes: &[Quote], baseline: &HashMap<String, f64>) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    let total: f64 = quotes
        .iter()
        .map(|quote| {
            let base = baseline.get(&quote.symbol).copied().unwrap_or(quote.price);
            (quote.price - base) / base
        })
        .sum();
    total / quotes.len() as f64
}
