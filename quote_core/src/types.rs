//! Quote domain types shared by the feed service and its consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a quote: the upstream venue or the synthetic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    Live,
    Synthetic,
}

/// Latest known price for one symbol. A new write for a symbol fully
/// replaces the previous one; no history is kept at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub source: QuoteSource,
}

/// Process-wide indicator of which producer is feeding the store.
/// `Unset` until the active producer starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    #[default]
    Unset,
    Live,
    Synthetic,
}

impl FeedMode {
    /// Consumer-facing view: `Unset` maps to "no mode yet".
    pub fn as_source(self) -> Option<QuoteSource> {
        match self {
            FeedMode::Unset => None,
            FeedMode::Live => Some(QuoteSource::Live),
            FeedMode::Synthetic => Some(QuoteSource::Synthetic),
        }
    }

    /// Stable label used when the mode is persisted externally.
    pub fn label(self) -> Option<&'static str> {
        match self {
            FeedMode::Unset => None,
            FeedMode::Live => Some("Live"),
            FeedMode::Synthetic => Some("Synthetic"),
        }
    }

    /// Inverse of [`label`](Self::label); unknown labels read as `Unset`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Live" => FeedMode::Live,
            "Synthetic" => FeedMode::Synthetic,
            _ => FeedMode::Unset,
        }
    }
}

impl From<QuoteSource> for FeedMode {
    fn from(source: QuoteSource) -> Self {
        match source {
            QuoteSource::Live => FeedMode::Live,
            QuoteSource::Synthetic => FeedMode::Synthetic,
        }
    }
}
