//! NAT-traversal walker: introduction-request/response and
//! puncture-request/puncture, plus LAN/WAN address estimation.

use std::time::{Duration, Instant};

use dispersy_shared::{is_valid_address, CommunityId, SockAddrV4};

use crate::request_cache::CacheEntry;

/// Estimates a peer's true LAN and WAN addresses the way the introduction
/// handler does: if we appear to share a WAN host with the observed
/// `sock_addr`, that must be their LAN address; otherwise a routable
/// `sock_addr` is itself their WAN address; claimed values are used only
/// as a last resort and are still filtered through [`is_valid_address`].
/// The result is always either `(0.0.0.0, 0)` or a validated, non-self
/// address.
pub fn estimate_lan_wan(
    sock_addr: SockAddrV4,
    claimed_lan: SockAddrV4,
    claimed_wan: SockAddrV4,
    our_wan_host: std::net::Ipv4Addr,
) -> (SockAddrV4, SockAddrV4) {
    let lan = if sock_addr.host == our_wan_host {
        sock_addr
    } else if is_valid_address(&claimed_lan) {
        claimed_lan
    } else {
        SockAddrV4::UNKNOWN
    };

    let wan = if sock_addr.host != our_wan_host && is_valid_address(&sock_addr) {
        sock_addr
    } else if is_valid_address(&claimed_wan) {
        claimed_wan
    } else {
        SockAddrV4::UNKNOWN
    };

    (lan, wan)
}

/// A pending `dispersy-introduction-request` we sent, awaiting a response
/// under its claimed identifier.
#[derive(Clone, Debug)]
pub struct IntroductionRequestCache {
    pub community: CommunityId,
    pub destination: SockAddrV4,
    pub requested_sync: bool,
}

impl CacheEntry for IntroductionRequestCache {
    fn kind(&self) -> &'static str {
        "introduction-request"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_millis(10_500)
    }
}

/// A pending `dispersy-puncture-request` forwarded on to the introduced
/// peer, whose `dispersy-puncture` response we still need to observe to
/// consider the introduction complete.
#[derive(Clone, Debug)]
pub struct PunctureRequestCache {
    pub community: CommunityId,
    pub walker: SockAddrV4,
}

impl CacheEntry for PunctureRequestCache {
    fn kind(&self) -> &'static str {
        "puncture-request"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_millis(10_500)
    }
}

/// Guards against introducing two symmetric-NAT peers behind different
/// hosts to each other: neither could ever puncture through to the other,
/// so the attempt would only waste a round trip.
pub fn is_valid_introduction_pair(
    requester_connection: super::ConnectionType,
    requester_host: std::net::Ipv4Addr,
    candidate_connection: super::ConnectionType,
    candidate_host: std::net::Ipv4Addr,
) -> bool {
    use super::ConnectionType::SymmetricNat;
    if requester_connection == SymmetricNat && candidate_connection == SymmetricNat {
        return requester_host == candidate_host;
    }
    true
}

/// One step of the walker's rotation target: per community, roughly one
/// walk every `max(0.1s, 5s / candidate_count)`, independent of the sync
/// cadence.
pub fn walk_interval(candidate_count: usize) -> Duration {
    if candidate_count == 0 {
        return Duration::from_secs(5);
    }
    let secs = (5.0 / candidate_count as f64).max(0.1);
    Duration::from_secs_f64(secs)
}

/// Detects wall-clock drift beyond tolerance; callers reset their walk
/// clock and bump a drift counter when this returns true.
pub fn has_drifted(last_tick: Instant, now: Instant, tolerance: Duration) -> bool {
    now.saturating_duration_since(last_tick) > tolerance
}
