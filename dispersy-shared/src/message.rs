//! The meta-message schema and the in-memory message envelope.

use crate::member::MemberId;
use crate::policy::{Authentication, Destination, Distribution, Resolution};
use crate::types::{CommunityId, GlobalTime};

/// The stable integer id a stored message row is assigned once persisted.
pub type MessageId = u64;

/// A meta-message: the per-community schema entry binding a name to its
/// four policies. The payload class, check callback, and handle callback
/// are supplied by the embedding application and are out of scope here;
/// this type only carries what the pipeline needs to route and validate.
#[derive(Clone, Debug)]
pub struct MetaMessage {
    pub name: &'static str,
    pub authentication: Authentication,
    pub resolution: Resolution,
    pub distribution: Distribution,
    pub destination: Destination,
}

impl MetaMessage {
    pub fn is_sequence_numbered(&self) -> bool {
        matches!(
            self.distribution,
            Distribution::FullSync {
                enable_sequence_number: true,
                ..
            }
        )
    }
}

/// A decoded message ready for pipeline processing.
#[derive(Clone, Debug)]
pub struct Message {
    pub community: CommunityId,
    pub meta: &'static str,
    pub authors: Vec<MemberId>,
    pub global_time: GlobalTime,
    pub sequence_number: Option<u32>,
    pub packet: Vec<u8>,
}

impl Message {
    /// The member treated as "the" author for single-authenticated
    /// messages, and the lexicographically-first author for
    /// double-authenticated ones (matching the stored `member_lo` column).
    pub fn primary_author(&self) -> Option<MemberId> {
        self.authors.iter().min().copied()
    }
}

/// A persisted message row, matching the logical schema:
/// `sync(id, community, member, global_time, meta_message, packet, undone)`.
#[derive(Clone, Debug)]
pub struct StoredRow {
    pub id: MessageId,
    pub community: CommunityId,
    pub member: MemberId,
    pub global_time: GlobalTime,
    pub meta: &'static str,
    pub packet: Vec<u8>,
    /// Zero when live; otherwise the id of the dispersy-undo message that
    /// undid this row.
    pub undone: MessageId,
}

impl StoredRow {
    pub fn is_undone(&self) -> bool {
        self.undone != 0
    }
}
