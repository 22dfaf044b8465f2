//! Per-meta-message policy tags.
//!
//! Modeled as plain data rather than a subtype hierarchy: the ingress
//! pipeline switches on the [`Distribution`] tag for its three specialized
//! validation routines, while the other policies compose purely by the data
//! they carry.

use crate::member::MemberId;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Authentication {
    None,
    SingleMember,
    DoubleMember,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Resolution {
    /// Anyone may publish.
    Public,
    /// Publishing requires an explicit permission grant recorded in the
    /// community's timeline.
    Linear,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Distribution {
    /// One-shot, never stored, never gossiped.
    Direct,
    /// Gossiped; contiguous sequence numbers optional.
    FullSync {
        enable_sequence_number: bool,
        priority: u8,
        direction: Direction,
    },
    /// Gossiped; bounded history per member (or per member-pair for
    /// double-authenticated meta-messages).
    LastSync {
        history_size: u32,
        priority: u8,
        direction: Direction,
    },
}

impl Distribution {
    pub fn priority(&self) -> u8 {
        match self {
            Distribution::Direct => 0,
            Distribution::FullSync { priority, .. } => *priority,
            Distribution::LastSync { priority, .. } => *priority,
        }
    }

    pub fn is_syncable(&self) -> bool {
        !matches!(self, Distribution::Direct)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Destination {
    /// Send to a random `count` peers from the community's candidate table.
    Community { count: usize },
    /// Send to exactly the given candidates (addresses resolved by the caller).
    Candidate,
    /// Send to the given member, resolved via the candidate table's member
    /// association.
    Member(MemberId),
}
