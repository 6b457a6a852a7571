//! Feed Service Integration Tests
//!
//! End-to-end checks of the synthetic pipeline against the in-memory store
//! with short injected intervals: supervisor -> generator -> store ->
//! query service -> poller.

use live_feed_rust::feed::synthetic::SyntheticFeed;
use live_feed_rust::feed::FeedSource;
use live_feed_rust::{FeedSupervisor, QueryService, QuotePoller};
use quote_core::{MemoryQuoteStore, QuoteSource, QuoteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn universe(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_synthetic_pipeline_populates_every_symbol() {
    let store = Arc::new(MemoryQuoteStore::new());
    let symbols = universe(&["SPY", "QQQ"]);

    let feed = SyntheticFeed::new(
        store.clone() as Arc<dyn QuoteStore>,
        symbols.clone(),
        Duration::from_millis(10),
    );
    let supervisor = FeedSupervisor::new(Box::new(feed), Duration::from_millis(50));
    let feed_task = tokio::spawn(supervisor.run());

    sleep(Duration::from_millis(50)).await;

    let query = QueryService::new(store.clone() as Arc<dyn QuoteStore>, symbols.clone());
    let snapshot = query.query(None).await.unwrap();
    feed_task.abort();

    assert_eq!(snapshot.quotes.len(), 2);
    for quote in &snapshot.quotes {
        assert_eq!(quote.source, QuoteSource::Synthetic);
        assert!(quote.price >= 1.0);
    }
    assert_eq!(snapshot.mode, Some(QuoteSource::Synthetic));
    assert!(snapshot.last_updated.is_some());
}

#[tokio::test]
async fn test_query_omits_symbols_the_feed_never_wrote() {
    let store = Arc::new(MemoryQuoteStore::new());
    let tracked = universe(&["SPY", "QQQ"]);

    let mut feed = SyntheticFeed::new(
        store.clone() as Arc<dyn QuoteStore>,
        tracked.clone(),
        Duration::from_millis(10),
    );
    feed.tick().await.unwrap();

    let query = QueryService::new(store.clone() as Arc<dyn QuoteStore>, tracked);
    let request = universe(&["SPY", "IWM", "QQQ"]);
    let snapshot = query.query(Some(&request)).await.unwrap();

    let names: Vec<&str> = snapshot.quotes.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(names, vec!["SPY", "QQQ"]);
}

#[tokio::test]
async fn test_poller_tracks_synthetic_feed_and_stops_cleanly() {
    let store = Arc::new(MemoryQuoteStore::new());
    let symbols = universe(&["SPY", "QQQ", "IWM"]);

    let feed = SyntheticFeed::new(
        store.clone() as Arc<dyn QuoteStore>,
        symbols.clone(),
        Duration::from_millis(10),
    );
    let supervisor = FeedSupervisor::new(Box::new(feed), Duration::from_millis(50));
    let feed_task = tokio::spawn(supervisor.run());

    let query = QueryService::new(store.clone() as Arc<dyn QuoteStore>, symbols.clone());
    let poller = QuotePoller::start(query, symbols.clone(), Duration::from_millis(15));

    sleep(Duration::from_millis(60)).await;

    let state = poller.state().await;
    assert_eq!(state.quotes.len(), 3);
    assert!(!state.baseline.is_empty());
    assert_eq!(state.mode, Some(QuoteSource::Synthetic));

    // After stop, further feed ticks no longer reach the poller's view.
    poller.stop();
    let frozen = poller.state().await;
    sleep(Duration::from_millis(40)).await;
    let after = poller.state().await;
    assert_eq!(frozen.last_updated, after.last_updated);

    feed_task.abort();
}

#[tokio::test]
async fn test_supervisor_restarts_a_closing_live_session() {
    use anyhow::Result;
    use async_trait::async_trait;
    use quote_core::FeedMode;
    use std::sync::atomic::{AtomicU64, Ordering};

    // Stands in for an upstream session that the peer keeps closing.
    struct ClosingSession {
        sessions: Arc<AtomicU64>,
    }

    #[async_trait]
    impl FeedSource for ClosingSession {
        fn mode(&self) -> FeedMode {
            FeedMode::Live
        }

        async fn run(&mut self) -> Result<()> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let sessions = Arc::new(AtomicU64::new(0));
    let source = Box::new(ClosingSession {
        sessions: sessions.clone(),
    });
    let supervisor = FeedSupervisor::new(source, Duration::from_millis(10));
    let task = tokio::spawn(supervisor.run());

    sleep(Duration::from_millis(45)).await;
    task.abort();

    // One initial session plus repeated reconnects after the fixed delay.
    assert!(sessions.load(Ordering::SeqCst) >= 3);
}
