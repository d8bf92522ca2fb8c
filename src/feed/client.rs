//! Arena feed WebSocket client.
//!
//! Maintain a single WS connection to the arena event stream:
//! - Push-based receive: decoded events land in the ingress buffer as frames arrive
//! - A fixed-period drain tick publishes buffered events to the snapshot state
//! - Auto-reconnect with exponential backoff; no failure escalates to consumers
//!
//! Two tasks per client: one connection task (receive path + reconnect loop)
//! and one drain task. Consumers only ever read snapshots.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;

use super::state::{FeedSnapshot, FeedState, IngressBuffer};
use super::wire;

/// Reconnect delay schedule: doubles on every failed session, capped,
/// reset to the minimum by a successful open.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max,
        }
    }

    /// Delay to wait before the next attempt. Doubles the stored delay for
    /// the attempt after that.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (delay * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Client-side counters. Cheap atomics on the hot path; `snapshot()` for
/// anything consumer-facing.
#[derive(Debug, Default)]
pub struct FeedStats {
    pub frames_received: AtomicU64,
    pub events_decoded: AtomicU64,
    /// Malformed frames dropped by the decoder. Intentionally not logged
    /// per-frame; this counter is the only observable trace.
    pub frames_discarded: AtomicU64,
    pub connects: AtomicU64,
    pub disconnects: AtomicU64,
}

impl FeedStats {
    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct FeedStatsSnapshot {
    pub frames_received: u64,
    pub events_decoded: u64,
    pub frames_discarded: u64,
    pub connects: u64,
    pub disconnects: u64,
}

/// The arena feed client.
pub struct ArenaFeedClient {
    config: FeedConfig,
    state: RwLock<FeedState>,
    buffer: IngressBuffer,
    stats: FeedStats,
    running: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ArenaFeedClient {
    pub fn new(config: FeedConfig) -> Arc<Self> {
        let window_capacity = config.window_capacity;
        Arc::new(Self {
            config,
            state: RwLock::new(FeedState::new(window_capacity)),
            buffer: IngressBuffer::new(),
            stats: FeedStats::default(),
            running: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Create the client and start it in one step.
    pub fn spawn(config: FeedConfig) -> Arc<Self> {
        let client = Self::new(config);
        client.start();
        client
    }

    /// Start the connection and drain tasks. No-op if already running, so
    /// at most one connection is open or pending per client instance.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut tasks = self.tasks.lock();

        let conn_client = self.clone();
        tasks.push(tokio::spawn(async move {
            conn_client.connection_loop().await;
        }));

        let drain_client = self.clone();
        tasks.push(tokio::spawn(async move {
            drain_client.drain_loop().await;
        }));
    }

    /// Tear the client down: stop the drain timer, cancel any pending
    /// reconnect and drop the connection. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.state.write().set_connected(false);
        info!("arena feed client stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current consumer-visible state. Always consistent: the window and
    /// counts never disagree about a published batch.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.read().snapshot()
    }

    pub fn connected(&self) -> bool {
        self.state.read().connected()
    }

    pub fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    /// Connection task: one session at a time, backoff between failures.
    async fn connection_loop(self: Arc<Self>) {
        let mut backoff = Backoff::new(self.config.reconnect_min, self.config.reconnect_max);

        while self.is_running() {
            match self.connect_and_stream(&mut backoff).await {
                Ok(()) => info!("arena feed closed by server"),
                Err(e) => warn!(error = %e, "arena feed connection lost"),
            }

            self.mark_disconnected();

            if !self.is_running() {
                break;
            }

            let delay = backoff.next_delay();
            debug!(delay_ms = delay.as_millis() as u64, "reconnecting after backoff");
            sleep(delay).await;
        }
    }

    /// One connection session: open, stream frames until close or error.
    /// A successful open resets the backoff and flips `connected`.
    async fn connect_and_stream(&self, backoff: &mut Backoff) -> Result<()> {
        let (ws_stream, response) = connect_async(self.config.stream_url.as_str())
            .await
            .context("connect to arena feed")?;

        info!(status = %response.status(), "🔌 arena feed connected");
        backoff.reset();
        self.stats.connects.fetch_add(1, Ordering::Relaxed);
        if self.is_running() {
            self.state.write().set_connected(true);
        }

        let (mut write, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    self.handle_frame(&text);
                }
                Ok(Message::Ping(payload)) => {
                    let _ = write.send(Message::Pong(payload)).await;
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "arena feed close frame");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(anyhow::anyhow!("arena feed read error: {e}"));
                }
            }
        }

        Err(anyhow::anyhow!("arena feed stream ended"))
    }

    /// Receive path: decode one frame and stage it. Malformed frames only
    /// bump a counter; the stream must never stall on bad input.
    fn handle_frame(&self, text: &str) {
        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);
        match wire::decode_frame(text) {
            Some(event) => {
                self.stats.events_decoded.fetch_add(1, Ordering::Relaxed);
                self.buffer.push(event);
            }
            None => {
                self.stats.frames_discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Drain task: fixed-period tick, skipping missed ticks under load.
    async fn drain_loop(self: Arc<Self>) {
        let mut ticker = interval(self.config.drain_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !self.is_running() {
                break;
            }
            self.drain_once();
        }
    }

    /// One drain tick: take the whole buffer, publish it under one write
    /// lock. Empty take is a no-op tick.
    fn drain_once(&self) {
        let batch = self.buffer.take_all();
        if batch.is_empty() {
            return;
        }
        self.state.write().apply_batch(batch);
    }

    fn mark_disconnected(&self) {
        if !self.is_running() {
            return;
        }
        let mut state = self.state.write();
        if state.connected() {
            state.set_connected(false);
            self.stats.disconnects.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for ArenaFeedClient {
    fn drop(&mut self) {
        self.stop();
    }
}
