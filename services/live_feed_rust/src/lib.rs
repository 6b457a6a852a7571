//! live_feed_rust - live market-data ingestion and caching service
//!
//! Maintains a continuous feed of instrument prices (real upstream
//! websocket or synthetic random walk), normalizes them into the shared
//! quote store, and serves that cache to polling consumers.

pub mod config;
pub mod feed;
pub mod poller;
pub mod query;

pub use config::FeedServiceConfig;
pub use feed::supervisor::FeedSupervisor;
pub use poller::QuotePoller;
pub use query::{QueryService, QuoteSnapshot};
