//! WAN-address voting and connection-type inference.
//!
//! Each peer we talk to tells us what address it saw us connect from; we
//! treat that as a vote for our own WAN address. A node behind a
//! consistent (non-symmetric) NAT will get the same answer from everyone;
//! a node behind a symmetric NAT gets a different answer per peer, which
//! is the signal used to flag `connection_type = SymmetricNat`.

use std::collections::HashMap;

use dispersy_shared::{is_valid_address, SockAddrV4};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ConnectionType {
    #[default]
    Unknown,
    Public,
    SymmetricNat,
}

/// Tracks one vote per voter and the current winning WAN address.
pub struct WanVoteBox {
    /// voter sock_addr -> the address they claim we have
    votes_by_voter: HashMap<SockAddrV4, SockAddrV4>,
    wan_address: SockAddrV4,
    connection_type: ConnectionType,
}

impl Default for WanVoteBox {
    fn default() -> Self {
        WanVoteBox {
            votes_by_voter: HashMap::new(),
            wan_address: SockAddrV4::UNKNOWN,
            connection_type: ConnectionType::default(),
        }
    }
}

impl WanVoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wan_address(&self) -> SockAddrV4 {
        self.wan_address
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    /// Registers `voter`'s claim that our WAN address is `claimed`.
    /// Ignores self-votes from a peer on the same host as the address
    /// already held, which would otherwise let a single LAN-mate
    /// perpetually confirm a stale address.
    pub fn vote(&mut self, claimed: SockAddrV4, voter: SockAddrV4, lan_address: SockAddrV4) {
        if !is_valid_address(&claimed) {
            return;
        }
        if voter.host == self.wan_address.host || voter.host == lan_address.host {
            return;
        }

        self.votes_by_voter.insert(voter, claimed);
        self.recompute();
    }

    /// Withdraws a previously cast vote from `voter`, e.g. because that
    /// candidate was pruned.
    pub fn unvote(&mut self, voter: &SockAddrV4) {
        if self.votes_by_voter.remove(voter).is_some() {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let mut counts: HashMap<SockAddrV4, usize> = HashMap::new();
        for addr in self.votes_by_voter.values() {
            *counts.entry(*addr).or_insert(0) += 1;
        }

        if counts.is_empty() {
            return;
        }

        let incumbent_votes = counts.get(&self.wan_address).copied().unwrap_or(0);
        let mut best = self.wan_address;
        let mut best_votes = incumbent_votes;
        for (&addr, &count) in counts.iter() {
            // A strictly new address needs >= the incumbent's vote count to
            // take over; a genuine tie keeps the incumbent.
            if addr != self.wan_address && count >= best_votes {
                best = addr;
                best_votes = count;
            }
        }
        self.wan_address = best;

        self.connection_type = if counts.len() > 1 {
            ConnectionType::SymmetricNat
        } else if self.connection_type == ConnectionType::SymmetricNat {
            ConnectionType::Unknown
        } else {
            self.connection_type
        };
    }

    /// Call once the node's own LAN and WAN addresses are known to be
    /// identical (no NAT at all).
    pub fn mark_public_if_lan_equals_wan(&mut self, lan_address: SockAddrV4) {
        if lan_address == self.wan_address && !self.wan_address.is_unknown() {
            self.connection_type = ConnectionType::Public;
        }
    }
}
