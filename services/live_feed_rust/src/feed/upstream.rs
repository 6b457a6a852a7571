//! Upstream websocket feed adapter.
//!
//! Holds one streaming session to the venue and translates inbound trade
//! frames into quote store writes. Session logic lives in a small state
//! machine ([`UpstreamSession`]) driven by a [`SessionEvent`] channel so it
//! can be exercised without a live socket; the websocket transport task
//! only bridges the connection onto that channel. A transport error tears
//! the connection down and funnels into the same `Closed` event, keeping
//! the close path the single reconnection trigger.

use crate::feed::FeedSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use quote_core::{FeedMode, Quote, QuoteSource, QuoteStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Outbound subscribe directive, sent once per tracked symbol on open.
#[derive(Debug, Serialize)]
struct SubscribeDirective<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    symbol: &'a str,
}

/// Inbound frame envelope. Only `type == "trade"` frames carry data.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<TradeTick>,
}

#[derive(Debug, Deserialize)]
struct TradeTick {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: f64,
}

/// Connection lifecycle events delivered to the session state machine.
#[derive(Debug)]
pub enum SessionEvent {
    Opened,
    Frame(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Subscribed,
    Disconnected,
}

/// State machine for one upstream session, independent of the transport.
pub struct UpstreamSession {
    store: Arc<dyn QuoteStore>,
    symbols: Vec<String>,
    state: SessionState,
}

impl UpstreamSession {
    pub fn new(store: Arc<dyn QuoteStore>, symbols: Vec<String>) -> Self {
        Self {
            store,
            symbols,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Consume events until the connection closes. The channel dropping
    /// counts as a close: there is nothing left to receive from.
    pub async fn drive(
        mut self,
        mut events: mpsc::Receiver<SessionEvent>,
        commands: mpsc::Sender<String>,
    ) -> SessionState {
        while let Some(event) = events.recv().await {
            if self.apply(event, &commands).await == SessionState::Disconnected {
                return self.state;
            }
        }
        self.state = SessionState::Disconnected;
        self.state
    }

    /// Apply one event and return the resulting state.
    pub async fn apply(
        &mut self,
        event: SessionEvent,
        commands: &mpsc::Sender<String>,
    ) -> SessionState {
        match event {
            SessionEvent::Opened => {
                if let Err(e) = self.store.set_mode(FeedMode::Live).await {
                    warn!("Failed to record live feed mode: {}", e);
                }
                for symbol in &self.symbols {
                    let directive = SubscribeDirective {
                        kind: "subscribe",
                        symbol,
                    };
                    match serde_json::to_string(&directive) {
                        Ok(payload) => {
                            if commands.send(payload).await.is_err() {
                                // Transport already gone; wait for Closed.
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to encode subscribe for {}: {}", symbol, e),
                    }
                }
                info!("Subscribed to {} symbols on upstream feed", self.symbols.len());
                self.state = SessionState::Subscribed;
            }
            SessionEvent::Frame(text) => self.apply_frame(&text).await,
            SessionEvent::Closed => {
                info!("Upstream session closed");
                self.state = SessionState::Disconnected;
            }
        }
        self.state
    }

    /// Apply one inbound frame. Undecodable frames and frames of any other
    /// type are dropped without side effects and without ending the session.
    async fn apply_frame(&self, text: &str) {
        let frame: InboundFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Dropping undecodable frame: {}", e);
                return;
            }
        };
        if frame.kind != "trade" {
            return;
        }
        // Receipt time, not upstream event time.
        let now = Utc::now();
        for tick in frame.data {
            let quote = Quote {
                symbol: tick.symbol,
                price: tick.price,
                timestamp: now,
                source: QuoteSource::Live,
            };
            if let Err(e) = self.store.set(quote).await {
                warn!("Failed to store live quote: {}", e);
            }
        }
    }
}

/// One websocket session to the upstream venue.
pub struct UpstreamFeed {
    store: Arc<dyn QuoteStore>,
    symbols: Vec<String>,
    ws_url: String,
    api_key: String,
}

impl UpstreamFeed {
    pub fn new(
        store: Arc<dyn QuoteStore>,
        symbols: Vec<String>,
        ws_url: String,
        api_key: String,
    ) -> Self {
        Self {
            store,
            symbols,
            ws_url,
            api_key,
        }
    }
}

#[async_trait]
impl FeedSource for UpstreamFeed {
    fn mode(&self) -> FeedMode {
        FeedMode::Live
    }

    /// Run one session: connect, subscribe, apply frames until the
    /// connection closes. Reconnection belongs to the supervisor.
    async fn run(&mut self) -> Result<()> {
        let url = format!("{}?token={}", self.ws_url, self.api_key);
        let (ws_stream, _) = connect_async(&url)
            .await
            .context("upstream websocket connect failed")?;
        info!("Connected to upstream feed at {}", self.ws_url);

        let (events_tx, events_rx) = mpsc::channel(256);
        let (commands_tx, commands_rx) = mpsc::channel(64);

        let transport = tokio::spawn(run_transport(ws_stream, events_tx, commands_rx));

        let session = UpstreamSession::new(self.store.clone(), self.symbols.clone());
        session.drive(events_rx, commands_tx).await;

        transport.abort();
        Ok(())
    }
}

/// Bridge the websocket onto the session channels. Read errors break the
/// loop so they end in the same `Closed` event as a peer-initiated close.
async fn run_transport(
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: mpsc::Sender<SessionEvent>,
    mut commands: mpsc::Receiver<String>,
) {
    let (mut write, mut read) = ws_stream.split();

    if events.send(SessionEvent::Opened).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(payload) => {
                    if let Err(e) = write.send(Message::Text(payload)).await {
                        warn!("Upstream send failed: {}", e);
                        break;
                    }
                }
                None => break,
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if events.send(SessionEvent::Frame(text)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if write.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Upstream connection closed by peer");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Upstream websocket error: {}", e);
                    break;
                }
            }
        }
    }

    let _ = events.send(SessionEvent::Closed).await;
}
