//! Feed client configuration.
//!
//! Everything the client needs is an explicit struct passed at construction;
//! env vars only feed `from_env()`, they are never read elsewhere.

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_STREAM_URL: &str = "ws://127.0.0.1:8000/api/feed/ws";
pub const DEFAULT_WINDOW_CAPACITY: usize = 200;
pub const DEFAULT_DRAIN_MS: u64 = 16;
pub const DEFAULT_BACKOFF_MIN_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Arena event stream URL (ws:// or wss://). Scheme selection is a
    /// deployment concern; the client uses the URL as given.
    pub stream_url: String,
    /// Rolling window capacity; oldest events evicted beyond this.
    pub window_capacity: usize,
    /// Drain tick period. Fine enough for smooth refresh, coarse enough to
    /// avoid redundant work.
    pub drain_interval: Duration,
    /// Reconnect backoff bounds.
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            drain_interval: Duration::from_millis(DEFAULT_DRAIN_MS),
            reconnect_min: Duration::from_millis(DEFAULT_BACKOFF_MIN_MS),
            reconnect_max: Duration::from_millis(DEFAULT_BACKOFF_MAX_MS),
        }
    }
}

impl FeedConfig {
    /// Build a config from `ARENA_FEED_*` env vars, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            stream_url: env::var("ARENA_FEED_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
            window_capacity: env_parse("ARENA_FEED_WINDOW", DEFAULT_WINDOW_CAPACITY),
            drain_interval: Duration::from_millis(env_parse(
                "ARENA_FEED_DRAIN_MS",
                DEFAULT_DRAIN_MS,
            )),
            reconnect_min: Duration::from_millis(env_parse(
                "ARENA_FEED_BACKOFF_MIN_MS",
                DEFAULT_BACKOFF_MIN_MS,
            )),
            reconnect_max: Duration::from_millis(env_parse(
                "ARENA_FEED_BACKOFF_MAX_MS",
                DEFAULT_BACKOFF_MAX_MS,
            )),
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default,
{
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}
