//! Reference in-memory implementation of the [`SyncStorage`] collaborator,
//! used by the default node and by every test in this crate. A real
//! deployment plugs in a SQL-backed implementation instead; the relational
//! database technology itself is out of scope.

use std::collections::HashMap;

use dispersy_shared::{CommunityId, GlobalTime, MemberId, MessageId, StoredRow, SyncStorage};

#[derive(Default)]
pub struct InMemoryStorage {
    rows: HashMap<MessageId, StoredRow>,
    next_id: MessageId,
    /// (community, member, global_time) -> row id, enforcing the
    /// uniqueness invariant in O(1).
    index: HashMap<(CommunityId, MemberId, GlobalTime), MessageId>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncStorage for InMemoryStorage {
    fn insert_row(&mut self, mut row: StoredRow) -> MessageId {
        self.next_id += 1;
        let id = self.next_id;
        row.id = id;
        self.index.insert((row.community, row.member, row.global_time), id);
        self.rows.insert(id, row);
        id
    }

    fn find_row(&self, community: &CommunityId, member: MemberId, global_time: GlobalTime) -> Option<&StoredRow> {
        self.index
            .get(&(*community, member, global_time))
            .and_then(|id| self.rows.get(id))
    }

    fn delete_rows_by_member(&mut self, community: &CommunityId, member: MemberId) -> usize {
        let ids: Vec<MessageId> = self
            .rows
            .values()
            .filter(|r| &r.community == community && r.member == member)
            .map(|r| r.id)
            .collect();
        for id in &ids {
            if let Some(row) = self.rows.remove(id) {
                self.index.remove(&(row.community, row.member, row.global_time));
            }
        }
        ids.len()
    }

    fn rows_for_meta(&self, community: &CommunityId, meta: &'static str, member: Option<MemberId>) -> Vec<&StoredRow> {
        let mut rows: Vec<&StoredRow> = self
            .rows
            .values()
            .filter(|r| {
                &r.community == community
                    && r.meta == meta
                    && member.map(|m| m == r.member).unwrap_or(true)
            })
            .collect();
        rows.sort_by_key(|r| r.global_time);
        rows
    }

    fn count_for_meta_member(&self, community: &CommunityId, meta: &'static str, member: MemberId) -> usize {
        self.rows_for_meta(community, meta, Some(member)).len()
    }

    fn highest_sequence(&self, community: &CommunityId, meta: &'static str, member: MemberId) -> u32 {
        self.count_for_meta_member(community, meta, member) as u32
    }

    fn prune_oldest(&mut self, community: &CommunityId, meta: &'static str, member: MemberId) -> Option<StoredRow> {
        let oldest_id = self
            .rows
            .values()
            .filter(|r| &r.community == community && r.meta == meta && r.member == member)
            .min_by_key(|r| r.global_time)
            .map(|r| r.id)?;
        let row = self.rows.remove(&oldest_id)?;
        self.index.remove(&(row.community, row.member, row.global_time));
        Some(row)
    }

    fn set_undone(&mut self, row_id: MessageId, undone_by: MessageId) {
        if let Some(row) = self.rows.get_mut(&row_id) {
            row.undone = undone_by;
        }
    }

    fn rows_in_sync_range(
        &self,
        community: &CommunityId,
        time_low: GlobalTime,
        time_high: GlobalTime,
        modulo: u32,
        offset: u32,
    ) -> Vec<&StoredRow> {
        self.rows
            .values()
            .filter(|r| {
                &r.community == community
                    && !r.is_undone()
                    && r.global_time >= time_low
                    && r.global_time <= time_high
                    && modulo > 0
                    && (r.global_time + offset as u64) % modulo as u64 == 0
            })
            .collect()
    }
}
