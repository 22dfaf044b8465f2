//! Per-meta-message batching: accumulate arrivals into a window, flush on
//! size or age, so a burst of gossip does not trigger one handler
//! invocation per packet.

use std::time::{Duration, Instant};

use dispersy_shared::{Message, SockAddrV4};

use crate::config::BatchConfig;

pub struct PendingBatch {
    config: BatchConfig,
    first_arrival: Option<Instant>,
    items: Vec<(SockAddrV4, Message)>,
}

impl PendingBatch {
    pub fn new(config: BatchConfig) -> Self {
        PendingBatch {
            config,
            first_arrival: None,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, candidate: SockAddrV4, message: Message, now: Instant) {
        if self.first_arrival.is_none() {
            self.first_arrival = Some(now);
        }
        self.items.push((candidate, message));
    }

    pub fn should_flush(&self, now: Instant) -> bool {
        if self.items.len() >= self.config.max_size {
            return true;
        }
        match self.first_arrival {
            Some(t) => now.saturating_duration_since(t) >= self.config.max_window,
            None => false,
        }
    }

    /// Drains the batch, discarding items older than `max_age` (arrived so
    /// long ago that acting on them no longer makes sense, e.g. because the
    /// flush was itself delayed by an earlier blocking step).
    pub fn flush(&mut self, now: Instant) -> Vec<(SockAddrV4, Message)> {
        let max_age = self.config.max_age;
        let first_arrival = self.first_arrival;
        self.first_arrival = None;
        let items = std::mem::take(&mut self.items);
        match first_arrival {
            Some(t) if now.saturating_duration_since(t) > max_age => Vec::new(),
            _ => items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sorts a flushed batch by `(global_time, packet-bytes)`, the fixed total
/// order every distribution policy's batch handler relies on.
pub fn sort_batch(items: &mut [(SockAddrV4, Message)]) {
    items.sort_by(|(_, a), (_, b)| {
        a.global_time
            .cmp(&b.global_time)
            .then_with(|| a.packet.cmp(&b.packet))
    });
}
