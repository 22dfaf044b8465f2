//! Missing-* responders: five parallel sub-protocols, each backed by an
//! idempotent request-cache entry so concurrent requesters for the same
//! missing item share one outbound request and its callbacks.

use std::time::Duration;

use dispersy_shared::{CommunityId, GlobalTime, Mid};

use crate::request_cache::CacheEntry;

/// `missing-identity`: we saw a member's mid referenced but have never
/// received their `dispersy-identity` message.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MissingIdentityKey {
    pub community: CommunityId,
    pub mid: Mid,
}

#[derive(Clone, Debug)]
pub struct MissingIdentityCache {
    pub key: MissingIdentityKey,
    pub waiters: Vec<u64>,
}

impl CacheEntry for MissingIdentityCache {
    fn kind(&self) -> &'static str {
        "missing-identity"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_millis(4_500)
    }
}

/// `missing-message`: a specific `(mid, global_time)` referenced by a
/// signature or proof chain.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MissingMessageKey {
    pub community: CommunityId,
    pub mid: Mid,
    pub global_time: GlobalTime,
}

#[derive(Clone, Debug)]
pub struct MissingMessageCache {
    pub key: MissingMessageKey,
}

impl CacheEntry for MissingMessageCache {
    fn kind(&self) -> &'static str {
        "missing-message"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// `missing-last-message`: the newest message(s) of a given meta from a
/// member, used to bootstrap a last-sync policy's history window.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MissingLastMessageKey {
    pub community: CommunityId,
    pub mid: Mid,
    pub meta: &'static str,
}

#[derive(Clone, Debug)]
pub struct MissingLastMessageCache {
    pub key: MissingLastMessageKey,
}

impl CacheEntry for MissingLastMessageCache {
    fn kind(&self) -> &'static str {
        "missing-last-message"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// `missing-sequence`: a contiguous range of sequence numbers for a
/// member/meta. Requests are coalesced by widening the outstanding range
/// rather than ever sending two overlapping requests.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MissingSequenceKey {
    pub community: CommunityId,
    pub mid: Mid,
    pub meta: &'static str,
}

#[derive(Clone, Debug)]
pub struct MissingSequenceCache {
    pub key: MissingSequenceKey,
    pub low: u32,
    pub high: u32,
}

impl MissingSequenceCache {
    /// Widens the outstanding range to cover `[low, high]` if it is not
    /// already fully subsumed. Returns `true` if a (re)request is needed.
    pub fn merge(&mut self, low: u32, high: u32) -> bool {
        if low >= self.low && high <= self.high {
            return false;
        }
        self.low = self.low.min(low);
        self.high = self.high.max(high);
        true
    }
}

impl CacheEntry for MissingSequenceCache {
    fn kind(&self) -> &'static str {
        "missing-sequence"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// `missing-proof`: the authorize-proof chain justifying some permission
/// a linear-resolution message relies on.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MissingProofKey {
    pub community: CommunityId,
}

#[derive(Clone, Debug)]
pub struct MissingProofCache {
    pub key: MissingProofKey,
}

impl CacheEntry for MissingProofCache {
    fn kind(&self) -> &'static str {
        "missing-proof"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

/// Shared byte budget enforcement for a responder reply: stop adding
/// packets once `limit` would be exceeded, matching the overlay's
/// amplification-bounding rule for sync and missing-sequence responses.
pub fn take_within_byte_limit<'a>(packets: impl IntoIterator<Item = &'a [u8]>, limit: usize) -> Vec<&'a [u8]> {
    let mut taken = Vec::new();
    let mut used = 0usize;
    for packet in packets {
        if used + packet.len() > limit {
            break;
        }
        used += packet.len();
        taken.push(packet);
    }
    taken
}
