//! Arena Feed Client
//!
//! Maintains a persistent WebSocket connection to the arena event stream
//! (wagers, heartbeats, liquidations, research actions) and exposes a
//! bounded, always-consistent snapshot of recent activity for dashboard
//! rendering. Page layout, auth and CRUD surfaces live elsewhere; this
//! crate is only the stream client.

pub mod config;
pub mod feed;

pub use config::FeedConfig;
pub use feed::{ArenaEvent, ArenaFeedClient, EventKind, FeedSnapshot};
