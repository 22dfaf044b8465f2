//! `dispersy-undo-own` / `dispersy-undo-other` application, including the
//! second-undo-own malicious-behavior detection.

use std::collections::HashMap;

use dispersy_shared::{CommunityId, DropReason, GlobalTime, MemberId, MessageId, SyncStorage};

use crate::store::MessageStore;
use crate::timeline::{Permission, Timeline};

/// One member's prior undo-own issued per `(community, member, target)`,
/// where `target` is the global_time of the message being undone. A
/// member legitimately undoes many different own messages over time; only
/// a *second* undo-own naming the same target is proof of malice (the
/// first undo is definitive, so a second one for that target can only be
/// an attempt to re-litigate it).
#[derive(Default)]
pub struct UndoOwnLedger {
    prior: HashMap<(CommunityId, MemberId, GlobalTime), MessageId>,
}

pub enum UndoOutcome {
    Applied,
    /// The author had already issued a valid `dispersy-undo-own` against
    /// this same target; this is their second, proof of malicious
    /// behavior. Both undo packets must be retained, the author
    /// blacklisted, and all their messages purged.
    SecondUndoOwnDetected { first: MessageId },
    Rejected(DropReason),
}

impl UndoOwnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_own_undo(&mut self, community: CommunityId, member: MemberId, undo_id: MessageId, target_global_time: GlobalTime) -> UndoOutcome {
        match self.prior.get(&(community, member, target_global_time)) {
            Some(&first_id) => UndoOutcome::SecondUndoOwnDetected { first: first_id },
            None => {
                self.prior.insert((community, member, target_global_time), undo_id);
                UndoOutcome::Applied
            }
        }
    }
}

/// Applies a validated `dispersy-undo-other`: the undoing member must hold
/// the `undo` permission at the undo's global_time.
pub fn check_undo_other(timeline: &Timeline, meta: &'static str, undoer: MemberId, at: GlobalTime) -> Result<(), DropReason> {
    if timeline.has_permission(meta, undoer, Permission::Undo, at) {
        Ok(())
    } else {
        Err(DropReason::Unauthorized)
    }
}

/// Marks the target row undone and, on the second-own-undo path, purges
/// every row from the malicious member in this community.
pub fn apply_undo<S: SyncStorage>(
    store: &mut MessageStore<S>,
    community: &CommunityId,
    target_row_id: MessageId,
    undo_id: MessageId,
    purge_member: Option<MemberId>,
) {
    store.storage_mut().set_undone(target_row_id, undo_id);
    if let Some(member) = purge_member {
        store.storage_mut().delete_rows_by_member(community, member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_undo_own_is_applied_cleanly() {
        let mut ledger = UndoOwnLedger::new();
        let community = [0u8; 20];
        let outcome = ledger.record_own_undo(community, 1, 100, 50);
        assert!(matches!(outcome, UndoOutcome::Applied));
    }

    #[test]
    fn second_undo_own_against_the_same_target_is_flagged() {
        let mut ledger = UndoOwnLedger::new();
        let community = [0u8; 20];
        ledger.record_own_undo(community, 1, 100, 50);
        let outcome = ledger.record_own_undo(community, 1, 200, 50);
        assert!(matches!(outcome, UndoOutcome::SecondUndoOwnDetected { first: 100 }));
    }

    #[test]
    fn undo_own_against_distinct_targets_is_not_flagged() {
        let mut ledger = UndoOwnLedger::new();
        let community = [0u8; 20];
        assert!(matches!(ledger.record_own_undo(community, 1, 100, 50), UndoOutcome::Applied));
        assert!(matches!(ledger.record_own_undo(community, 1, 200, 70), UndoOutcome::Applied));
    }

    #[test]
    fn undo_other_requires_permission() {
        let timeline = Timeline::new();
        let result = check_undo_other(&timeline, "m", 1, 10);
        assert!(matches!(result, Err(DropReason::Unauthorized)));
    }

    #[test]
    fn undo_other_succeeds_once_granted() {
        let mut timeline = Timeline::new();
        timeline.authorize("m", 1, Permission::Undo, 0);
        assert!(check_undo_other(&timeline, "m", 1, 10).is_ok());
    }
}
