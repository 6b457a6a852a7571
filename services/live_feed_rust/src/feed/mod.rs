//! Quote producers and the supervisor that owns them.

pub mod supervisor;
pub mod synthetic;
pub mod upstream;

use anyhow::Result;
use async_trait::async_trait;
use quote_core::FeedMode;

/// Uniform contract for a quote producer. The supervisor owns exactly one
/// source at a time, so producers never write to the store concurrently.
///
/// `run` drives one session: for the live feed it returns when the
/// connection closes, for the synthetic generator it only returns on a
/// store failure.
#[async_trait]
pub trait FeedSource: Send {
    fn mode(&self) -> FeedMode;

    async fn run(&mut self) -> Result<()>;
}
