//! quote_core - shared quote domain types and the latest-quote store

pub mod store;
pub mod types;

pub use store::{MemoryQuoteStore, QuoteStore, RedisQuoteStore};
pub use types::{FeedMode, Quote, QuoteSource};
