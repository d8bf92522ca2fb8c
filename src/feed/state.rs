//! Consumer-visible feed state and the ingress staging buffer.
//!
//! Two writers exist: the drain tick (window / last_event / counts) and the
//! connection task (connected). Both go through the same lock, so a reader
//! can never observe a window that disagrees with its counts.

use std::collections::VecDeque;
use std::mem;

use parking_lot::Mutex;
use serde::Serialize;

use super::wire::{ArenaEvent, EventKind};

/// Per-category event counters for the lifetime of one client instance.
///
/// Monotonically non-decreasing; a reconnect never resets these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub wagers: u64,
    pub heartbeats: u64,
    pub liquidations: u64,
    pub research: u64,
}

impl CategoryCounts {
    pub fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Wager => self.wagers += 1,
            EventKind::Heartbeat => self.heartbeats += 1,
            EventKind::Liquidation => self.liquidations += 1,
            EventKind::Research => self.research += 1,
        }
    }

    pub fn get(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Wager => self.wagers,
            EventKind::Heartbeat => self.heartbeats,
            EventKind::Liquidation => self.liquidations,
            EventKind::Research => self.research,
        }
    }

    pub fn total(&self) -> u64 {
        self.wagers + self.heartbeats + self.liquidations + self.research
    }
}

/// Read-only view handed to consumers (API routes, monitor, UI push).
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub connected: bool,
    /// Most recent events, newest first, at most `window_capacity` entries.
    pub window: Vec<ArenaEvent>,
    pub last_event: Option<ArenaEvent>,
    pub counts: CategoryCounts,
}

/// Mutable feed state. Owned by the client behind a single lock; consumers
/// only ever get a `FeedSnapshot` clone.
#[derive(Debug)]
pub struct FeedState {
    window: VecDeque<ArenaEvent>,
    last_event: Option<ArenaEvent>,
    counts: CategoryCounts,
    connected: bool,
    window_capacity: usize,
}

impl FeedState {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_capacity.min(1024)),
            last_event: None,
            counts: CategoryCounts::default(),
            connected: false,
            window_capacity,
        }
    }

    /// Publish one drained batch (newest first) in a single step.
    ///
    /// Prepends the batch onto the window preserving order, truncates to
    /// capacity, updates `last_event` to the batch head and bumps the
    /// per-category counters. Empty batches are the caller's no-op case.
    pub fn apply_batch(&mut self, batch: VecDeque<ArenaEvent>) {
        debug_assert!(!batch.is_empty());

        self.last_event = batch.front().copied();
        for ev in &batch {
            self.counts.record(ev.kind);
        }

        // Oldest batch entry first so the batch head ends up at the front.
        for ev in batch.into_iter().rev() {
            self.window.push_front(ev);
        }
        self.window.truncate(self.window_capacity);
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            connected: self.connected,
            window: self.window.iter().copied().collect(),
            last_event: self.last_event,
            counts: self.counts,
        }
    }
}

/// Staging buffer between the receive path and the drain tick.
///
/// Push-only from the receive side, newest at the front. The drain side
/// takes the entire contents in one swap; no event can be seen by two
/// drains or dropped in between.
#[derive(Debug, Default)]
pub struct IngressBuffer {
    inner: Mutex<VecDeque<ArenaEvent>>,
}

impl IngressBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: ArenaEvent) {
        self.inner.lock().push_front(event);
    }

    /// Atomically take everything buffered so far, leaving it empty.
    pub fn take_all(&self) -> VecDeque<ArenaEvent> {
        mem::take(&mut *self.inner.lock())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(ts: i64, kind: EventKind, bot_id: i64, amount: Option<f64>) -> ArenaEvent {
        ArenaEvent {
            ts,
            kind,
            bot_id,
            amount,
        }
    }

    #[test]
    fn test_window_truncates_to_capacity_newest_first() {
        // Spec'd dashboard scenario: capacity 3, four events arriving in order.
        let mut state = FeedState::new(3);
        let buffer = IngressBuffer::new();

        buffer.push(ev(1, EventKind::Wager, 5, None));
        buffer.push(ev(2, EventKind::Heartbeat, 1, None));
        state.apply_batch(buffer.take_all());

        buffer.push(ev(3, EventKind::Liquidation, 5, Some(100.0)));
        buffer.push(ev(4, EventKind::Research, 2, None));
        state.apply_batch(buffer.take_all());

        let snap = state.snapshot();
        assert_eq!(snap.window.len(), 3);
        assert_eq!(snap.window[0].ts, 4);
        assert_eq!(snap.window[1].ts, 3);
        assert_eq!(snap.window[2].ts, 2);
        assert_eq!(snap.last_event.unwrap().ts, 4);
        assert_eq!(
            snap.counts,
            CategoryCounts {
                wagers: 1,
                heartbeats: 1,
                liquidations: 1,
                research: 1,
            }
        );
    }

    #[test]
    fn test_single_batch_preserves_arrival_order() {
        let mut state = FeedState::new(10);
        let buffer = IngressBuffer::new();
        for ts in 1..=5 {
            buffer.push(ev(ts, EventKind::Wager, ts, None));
        }
        state.apply_batch(buffer.take_all());

        let snap = state.snapshot();
        let got: Vec<i64> = snap.window.iter().map(|e| e.ts).collect();
        assert_eq!(got, vec![5, 4, 3, 2, 1]);
        assert_eq!(snap.last_event.unwrap().ts, 5);
    }

    #[test]
    fn test_counts_monotone_across_batches() {
        let mut state = FeedState::new(2);
        let buffer = IngressBuffer::new();

        buffer.push(ev(1, EventKind::Wager, 1, None));
        state.apply_batch(buffer.take_all());
        assert_eq!(state.snapshot().counts.wagers, 1);

        buffer.push(ev(2, EventKind::Wager, 1, None));
        buffer.push(ev(3, EventKind::Wager, 2, None));
        state.apply_batch(buffer.take_all());

        // Window only holds 2 entries but counts cover everything ever seen.
        let snap = state.snapshot();
        assert_eq!(snap.window.len(), 2);
        assert_eq!(snap.counts.wagers, 3);
        assert_eq!(snap.counts.total(), 3);
    }

    #[test]
    fn test_connected_flag_independent_of_window() {
        let mut state = FeedState::new(4);
        assert!(!state.connected());
        state.set_connected(true);

        let buffer = IngressBuffer::new();
        buffer.push(ev(1, EventKind::Heartbeat, 9, None));
        state.apply_batch(buffer.take_all());

        let snap = state.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.counts.heartbeats, 1);

        state.set_connected(false);
        assert!(!state.snapshot().connected);
        // Disconnect does not clear the window or counts.
        assert_eq!(state.snapshot().window.len(), 1);
        assert_eq!(state.snapshot().counts.heartbeats, 1);
    }

    #[test]
    fn test_take_all_empties_buffer() {
        let buffer = IngressBuffer::new();
        buffer.push(ev(1, EventKind::Wager, 1, None));
        buffer.push(ev(2, EventKind::Research, 2, None));
        assert_eq!(buffer.len(), 2);

        let batch = buffer.take_all();
        assert_eq!(batch.len(), 2);
        // Newest first: ordering established on push, not on drain.
        assert_eq!(batch[0].ts, 2);
        assert_eq!(batch[1].ts, 1);

        assert!(buffer.is_empty());
        assert!(buffer.take_all().is_empty());
    }
}
