//! The message store: enforces the uniqueness, sequence-contiguity, and
//! last-sync bound invariants against a [`SyncStorage`] collaborator.

pub mod memory;

use dispersy_shared::{
    CommunityId, GlobalTime, MemberId, Message, MessageId, StoredRow, SyncStorage,
};

/// Outcome of attempting to insert a batch-checked message.
pub enum Insert {
    Stored(MessageId),
    /// Identical packet already present; if the existing row is undone,
    /// its undo proof should be resent to the sender.
    DuplicateIdentical { resend_undo: Option<MessageId> },
    /// Same logical slot, different signature: the lexicographically
    /// smaller packet wins and was kept (ours, if `kept_theirs` is false).
    DuplicateConflicting { kept_theirs: bool },
}

pub struct MessageStore<S: SyncStorage> {
    storage: S,
}

impl<S: SyncStorage> MessageStore<S> {
    pub fn new(storage: S) -> Self {
        MessageStore { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Full duplicate-detection/tie-break for a full-sync or last-sync
    /// message that passed its distribution-policy check.
    pub fn insert_syncable(&mut self, community: &CommunityId, member: MemberId, message: &Message) -> Insert {
        if let Some(existing) = self.storage.find_row(community, member, message.global_time) {
            if existing.packet == message.packet {
                return Insert::DuplicateIdentical {
                    resend_undo: existing.is_undone().then_some(existing.undone),
                };
            }
            if existing.packet < message.packet {
                return Insert::DuplicateConflicting { kept_theirs: false };
            }
            let id = existing.id;
            self.overwrite_packet(id, community, member, message);
            return Insert::DuplicateConflicting { kept_theirs: true };
        }

        let row = StoredRow {
            id: 0,
            community: *community,
            member,
            global_time: message.global_time,
            meta: message.meta,
            packet: message.packet.clone(),
            undone: 0,
        };
        Insert::Stored(self.storage.insert_row(row))
    }

    fn overwrite_packet(&mut self, row_id: MessageId, community: &CommunityId, member: MemberId, message: &Message) {
        // The reference in-memory backend models overwrite as delete+insert
        // since the logical schema keys on (community, member, global_time)
        // rather than the surrogate row id.
        let _ = row_id;
        self.storage.delete_rows_by_member(community, member);
        let row = StoredRow {
            id: 0,
            community: *community,
            member,
            global_time: message.global_time,
            meta: message.meta,
            packet: message.packet.clone(),
            undone: 0,
        };
        self.storage.insert_row(row);
    }

    /// Sequence-contiguity check for a full-sync, sequence-numbered
    /// message: accepts exactly `highest + 1`, rejects `<= highest` as a
    /// duplicate, and reports the gap to delay on for anything further
    /// ahead.
    pub fn check_sequence(
        &self,
        community: &CommunityId,
        meta: &'static str,
        member: MemberId,
        sequence_number: u32,
    ) -> SequenceCheck {
        let highest = self.storage.highest_sequence(community, meta, member);
        if sequence_number <= highest {
            SequenceCheck::Duplicate
        } else if sequence_number == highest + 1 {
            SequenceCheck::Accept
        } else {
            SequenceCheck::Gap {
                low: highest + 1,
                high: sequence_number - 1,
            }
        }
    }

    /// Last-sync bound check: is this `global_time` old enough to be
    /// rejected outright given the current history window?
    pub fn check_last_sync_bound(
        &self,
        community: &CommunityId,
        meta: &'static str,
        member: MemberId,
        history_size: u32,
        global_time: GlobalTime,
    ) -> LastSyncCheck {
        let rows = self.storage.rows_for_meta(community, meta, Some(member));
        if (rows.len() as u32) < history_size {
            return LastSyncCheck::Accept;
        }
        let min_time = rows.iter().map(|r| r.global_time).min().unwrap_or(0);
        if min_time > global_time {
            // The peer sending this is behind; if there is exactly one
            // slot of history, hand back what we have so they can
            // converge without another round trip.
            let resend = if history_size == 1 {
                rows.into_iter().max_by_key(|r| r.global_time).map(|r| r.id)
            } else {
                None
            };
            LastSyncCheck::Old { resend_newest: resend }
        } else {
            LastSyncCheck::AcceptAndPrune
        }
    }
}

pub enum SequenceCheck {
    Accept,
    Duplicate,
    Gap { low: u32, high: u32 },
}

pub enum LastSyncCheck {
    Accept,
    AcceptAndPrune,
    Old { resend_newest: Option<MessageId> },
}
