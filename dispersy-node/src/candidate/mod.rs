//! Candidate table: per-community peer views, WAN-address voting, and
//! connection-type inference.

mod wan_vote;
pub mod walker;

pub use wan_vote::{ConnectionType, WanVoteBox};

use std::collections::HashMap;
use std::time::Instant;

use dispersy_shared::{CommunityId, MemberId, SockAddrV4};

/// Candidate category: who initiated the most recent contact. Purely
/// time-decayed; there is no explicit "demote" call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Category {
    /// We walked to them recently.
    Walk,
    /// They walked to us recently.
    Stumble,
    /// We were introduced to them recently but have not yet walked to them.
    Intro,
    /// Known, but none of the above within their decay window.
    None,
}

#[derive(Clone, Debug)]
pub struct CommunityView {
    pub category: Category,
    pub last_walk: Option<Instant>,
    pub last_stumble: Option<Instant>,
    pub last_intro: Option<Instant>,
    pub last_active: Option<Instant>,
    pub associated_member: Option<MemberId>,
}

impl Default for CommunityView {
    fn default() -> Self {
        CommunityView {
            category: Category::None,
            last_walk: None,
            last_stumble: None,
            last_intro: None,
            last_active: None,
            associated_member: None,
        }
    }
}

/// Decay windows for each category, matching the walk cadence named in the
/// design (roughly one walk per community per `5/N` seconds, a much
/// shorter-lived `stumble`/`intro` window than the candidate's overall
/// lifetime in the table).
const WALK_DECAY: std::time::Duration = std::time::Duration::from_secs(30);
const STUMBLE_DECAY: std::time::Duration = std::time::Duration::from_secs(30);
const INTRO_DECAY: std::time::Duration = std::time::Duration::from_millis(10_500 * 3);
const OBSOLETE_AFTER: std::time::Duration = std::time::Duration::from_secs(5 * 60);

impl CommunityView {
    pub fn mark_walk(&mut self, now: Instant) {
        self.last_walk = Some(now);
        self.last_active = Some(now);
        self.category = Category::Walk;
    }

    pub fn mark_stumble(&mut self, now: Instant) {
        self.last_stumble = Some(now);
        self.last_active = Some(now);
        self.category = Category::Stumble;
    }

    pub fn mark_intro(&mut self, now: Instant) {
        self.last_intro = Some(now);
        self.category = Category::Intro;
    }

    /// Recompute `category` from the decay windows; call before reading it.
    pub fn refresh(&mut self, now: Instant) {
        let fresh = |at: Option<Instant>, window: std::time::Duration| {
            at.map(|t| now.saturating_duration_since(t) < window).unwrap_or(false)
        };
        self.category = if fresh(self.last_walk, WALK_DECAY) {
            Category::Walk
        } else if fresh(self.last_stumble, STUMBLE_DECAY) {
            Category::Stumble
        } else if fresh(self.last_intro, INTRO_DECAY) {
            Category::Intro
        } else {
            Category::None
        };
    }

    pub fn is_obsolete(&self, now: Instant) -> bool {
        match self.last_active.or(self.last_intro) {
            None => true,
            Some(t) => now.saturating_duration_since(t) > OBSOLETE_AFTER,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub sock_addr: SockAddrV4,
    pub lan_address: SockAddrV4,
    pub wan_address: SockAddrV4,
    pub tunnel: bool,
    pub connection_type: ConnectionType,
    pub communities: HashMap<CommunityId, CommunityView>,
}

impl Candidate {
    pub fn new(sock_addr: SockAddrV4, lan_address: SockAddrV4, wan_address: SockAddrV4) -> Self {
        Candidate {
            sock_addr,
            lan_address,
            wan_address,
            tunnel: false,
            connection_type: ConnectionType::Unknown,
            communities: HashMap::new(),
        }
    }

    pub fn view_mut(&mut self, community: CommunityId) -> &mut CommunityView {
        self.communities.entry(community).or_default()
    }

    pub fn is_all_obsolete(&self, now: Instant) -> bool {
        self.communities.values().all(|view| view.is_obsolete(now))
    }
}

/// Read-through view of candidates across every community. Owns candidates
/// keyed by their observed `sock_addr`; per-community association lives on
/// the candidate itself rather than in a second owning map, so detaching a
/// community from one view never orphans candidates still relevant to
/// another.
#[derive(Default)]
pub struct CandidateTable {
    candidates: HashMap<SockAddrV4, Candidate>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, sock_addr: SockAddrV4) -> &mut Candidate {
        self.candidates
            .entry(sock_addr)
            .or_insert_with(|| Candidate::new(sock_addr, SockAddrV4::UNKNOWN, SockAddrV4::UNKNOWN))
    }

    pub fn get(&self, sock_addr: &SockAddrV4) -> Option<&Candidate> {
        self.candidates.get(sock_addr)
    }

    pub fn get_mut(&mut self, sock_addr: &SockAddrV4) -> Option<&mut Candidate> {
        self.candidates.get_mut(sock_addr)
    }

    pub fn remove(&mut self, sock_addr: &SockAddrV4) -> Option<Candidate> {
        self.candidates.remove(sock_addr)
    }

    /// Candidates participating in `community`, for random-selection
    /// callers (the walker's `yield_walk_candidates`, the introducer's
    /// random-peer pick).
    pub fn in_community<'a>(&'a self, community: &'a CommunityId) -> impl Iterator<Item = &'a Candidate> {
        self.candidates
            .values()
            .filter(move |c| c.communities.contains_key(community))
    }

    /// Drops every candidate obsolete in every community it belongs to.
    /// Intended to run on the periodic cleanup interval (§5).
    pub fn cleanup(&mut self, now: Instant) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|_, c| !c.is_all_obsolete(now));
        before - self.candidates.len()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(d: u8, port: u16) -> SockAddrV4 {
        SockAddrV4::new(Ipv4Addr::new(10, 0, 0, d), port)
    }

    #[test]
    fn cleanup_drops_fully_obsolete_candidates() {
        let mut table = CandidateTable::new();
        let cid: CommunityId = [1u8; 20];
        let now = Instant::now();
        let candidate = table.get_or_insert(addr(1, 1234));
        candidate.view_mut(cid); // default view, never marked active => obsolete
        assert_eq!(table.cleanup(now), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn active_candidates_survive_cleanup() {
        let mut table = CandidateTable::new();
        let cid: CommunityId = [2u8; 20];
        let now = Instant::now();
        let candidate = table.get_or_insert(addr(2, 1234));
        candidate.view_mut(cid).mark_walk(now);
        assert_eq!(table.cleanup(now), 0);
        assert_eq!(table.len(), 1);
    }
}
