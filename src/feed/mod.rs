//! Real-time arena event feed.
//!
//! Data path: WS frame -> decode/validate -> ingress buffer -> drain tick ->
//! snapshot state. Control path: close/error -> backoff -> reconnect.

pub mod client;
pub mod state;
pub mod wire;

pub use client::{ArenaFeedClient, Backoff, FeedStats, FeedStatsSnapshot};
pub use state::{CategoryCounts, FeedSnapshot, IngressBuffer};
pub use wire::{decode_frame, ArenaEvent, EventKind};
