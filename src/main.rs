//! Arena feed monitor - connect to the live arena stream and log a snapshot
//! summary at a fixed cadence until Ctrl-C.
//!
//! Useful for eyeballing feed health (connectivity, event mix, discard rate)
//! without a dashboard in front of it.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_feed::config::FeedConfig;
use arena_feed::feed::ArenaFeedClient;

#[derive(Parser, Debug)]
#[command(name = "arena-feed-monitor", about = "Live arena event feed monitor")]
struct Args {
    /// Arena event stream URL (ws:// or wss://)
    #[arg(long, env = "ARENA_FEED_URL")]
    url: Option<String>,

    /// Rolling window capacity
    #[arg(long, env = "ARENA_FEED_WINDOW")]
    window: Option<usize>,

    /// Seconds between snapshot log lines
    #[arg(long, default_value_t = 1)]
    report_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let args = Args::parse();

    let mut config = FeedConfig::from_env();
    if let Some(url) = args.url {
        config.stream_url = url;
    }
    if let Some(window) = args.window.filter(|w| *w > 0) {
        config.window_capacity = window;
    }

    info!(url = %config.stream_url, window = config.window_capacity, "🔌 starting arena feed monitor");

    let client = ArenaFeedClient::spawn(config);

    let mut report = tokio::time::interval(Duration::from_secs(args.report_secs.max(1)));
    loop {
        tokio::select! {
            _ = report.tick() => {
                let snap = client.snapshot();
                let stats = client.stats();
                let last_age_s = snap
                    .last_event
                    .map(|e| chrono::Utc::now().timestamp().saturating_sub(e.ts));
                info!(
                    connected = snap.connected,
                    window = snap.window.len(),
                    wagers = snap.counts.wagers,
                    heartbeats = snap.counts.heartbeats,
                    liquidations = snap.counts.liquidations,
                    research = snap.counts.research,
                    discarded = stats.frames_discarded,
                    last_age_s,
                    "feed snapshot"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                client.stop();
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_feed=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
