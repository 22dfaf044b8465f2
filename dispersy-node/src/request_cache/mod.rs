//! Correlates outstanding requests with their asynchronous responses.
//!
//! The original implementation registers `on_timeout`/`on_cleanup`
//! callbacks with a cooperative task scheduler. This engine is driven by an
//! explicit `Node::tick(now)` poll instead of a callback registry (see the
//! concurrency model), so timeouts and cleanups are surfaced as a drained
//! `Vec` of events from [`RequestCache::poll`] rather than fired inline.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::CacheError;

/// Anything that can be parked in the request cache. `kind` is checked on
/// every lookup so two unrelated protocols can never be confused even if
/// their identifiers happen to collide in the 16-bit space.
pub trait CacheEntry {
    fn kind(&self) -> &'static str;
    /// How long before this entry times out, counted from the moment it is
    /// set.
    fn timeout_delay(&self) -> Duration;
    /// How long a timed-out entry is kept around for late duplicate
    /// responses before being purged for good. Zero means "purge
    /// immediately on timeout".
    fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

struct Slot<T> {
    entry: T,
    set_at: Instant,
    /// `None` while live, `Some(purge_at)` once timed out and waiting out
    /// its cleanup grace window.
    cleanup_until: Option<Instant>,
}

/// An event produced by [`RequestCache::poll`].
pub enum CacheEvent<T> {
    Timeout(u16, T),
}

pub struct RequestCache<T> {
    slots: HashMap<u16, Slot<T>>,
}

impl<T> Default for RequestCache<T> {
    fn default() -> Self {
        RequestCache {
            slots: HashMap::new(),
        }
    }
}

impl<T: CacheEntry + Clone> RequestCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a uniformly-random 16-bit identifier not currently in use and
    /// installs `entry` under it.
    pub fn claim(&mut self, entry: T, now: Instant) -> u16 {
        loop {
            let identifier = fastrand::u16(..);
            if !self.slots.contains_key(&identifier) {
                self.set(identifier, entry, now);
                return identifier;
            }
        }
    }

    pub fn set(&mut self, identifier: u16, entry: T, now: Instant) {
        self.slots.insert(
            identifier,
            Slot {
                entry,
                set_at: now,
                cleanup_until: None,
            },
        );
    }

    pub fn has(&self, identifier: u16, kind: &'static str) -> bool {
        self.slots
            .get(&identifier)
            .map(|slot| slot.entry.kind() == kind)
            .unwrap_or(false)
    }

    pub fn get(&self, identifier: u16, kind: &'static str) -> Result<&T, CacheError> {
        let slot = self.slots.get(&identifier).ok_or(CacheError::NotFound(identifier))?;
        if slot.entry.kind() != kind {
            return Err(CacheError::KindMismatch(identifier));
        }
        Ok(&slot.entry)
    }

    /// Returns the entry to the caller, then moves it into the cleanup
    /// grace window (if it has one) rather than erasing it immediately, so
    /// a late duplicate response can still be matched and silently
    /// discarded instead of treated as unsolicited.
    pub fn pop(&mut self, identifier: u16, kind: &'static str, now: Instant) -> Result<T, CacheError> {
        let slot = self.slots.get(&identifier).ok_or(CacheError::NotFound(identifier))?;
        if slot.entry.kind() != kind {
            return Err(CacheError::KindMismatch(identifier));
        }
        let entry = slot.entry.clone();
        let cleanup_delay = entry.cleanup_delay();
        if cleanup_delay.is_zero() {
            self.slots.remove(&identifier);
        } else {
            self.slots.get_mut(&identifier).unwrap().cleanup_until = Some(now + cleanup_delay);
        }
        Ok(entry)
    }

    /// Advances time: fires `Timeout` for entries whose `timeout_delay` has
    /// elapsed and that have not yet been popped, then purges anything
    /// whose cleanup grace window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<CacheEvent<T>> {
        let mut timed_out = Vec::new();
        let mut purge = Vec::new();

        for (&identifier, slot) in self.slots.iter() {
            match slot.cleanup_until {
                Some(purge_at) => {
                    if now >= purge_at {
                        purge.push(identifier);
                    }
                }
                None => {
                    if now >= slot.set_at + slot.entry.timeout_delay() {
                        timed_out.push(identifier);
                    }
                }
            }
        }

        let mut events = Vec::with_capacity(timed_out.len());
        for identifier in timed_out {
            let cleanup_delay = self.slots[&identifier].entry.cleanup_delay();
            let entry = self.slots[&identifier].entry.clone();
            events.push(CacheEvent::Timeout(identifier, entry));
            if cleanup_delay.is_zero() {
                self.slots.remove(&identifier);
            } else {
                self.slots.get_mut(&identifier).unwrap().cleanup_until = Some(now + cleanup_delay);
            }
        }
        for identifier in purge {
            self.slots.remove(&identifier);
        }

        events
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Dummy;
    impl CacheEntry for Dummy {
        fn kind(&self) -> &'static str {
            "dummy"
        }
        fn timeout_delay(&self) -> Duration {
            Duration::from_millis(10)
        }
        fn cleanup_delay(&self) -> Duration {
            Duration::from_millis(10)
        }
    }

    #[test]
    fn claim_assigns_unique_identifier() {
        let mut cache = RequestCache::<Dummy>::new();
        let now = Instant::now();
        let id = cache.claim(Dummy, now);
        assert!(cache.has(id, "dummy"));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut cache = RequestCache::<Dummy>::new();
        let now = Instant::now();
        let id = cache.claim(Dummy, now);
        assert!(matches!(cache.get(id, "other"), Err(CacheError::KindMismatch(_))));
    }

    #[test]
    fn timeout_fires_once_after_delay() {
        let mut cache = RequestCache::<Dummy>::new();
        let now = Instant::now();
        let id = cache.claim(Dummy, now);
        assert!(cache.poll(now).is_empty());
        let later = now + Duration::from_millis(20);
        let events = cache.poll(later);
        assert_eq!(events.len(), 1);
        match &events[0] {
            CacheEvent::Timeout(got_id, _) => assert_eq!(*got_id, id),
        }
        // Still in cleanup grace window: a late duplicate response can
        // still find the entry, it is simply not removed by the caller.
        assert!(cache.has(id, "dummy"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn purge_after_cleanup_window() {
        let mut cache = RequestCache::<Dummy>::new();
        let now = Instant::now();
        let id = cache.claim(Dummy, now);
        cache.poll(now + Duration::from_millis(20));
        assert_eq!(cache.len(), 1);
        cache.poll(now + Duration::from_millis(40));
        assert_eq!(cache.len(), 0);
        let _ = id;
    }
}
