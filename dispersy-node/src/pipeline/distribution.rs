//! Distribution-policy validation: the three specialized batch checks the
//! ingress pipeline runs before a message may reach the store.

use dispersy_shared::{CommunityId, DelayReason, DropReason, GlobalTime, MemberId, Message};

use crate::store::{LastSyncCheck, MessageStore, SequenceCheck};
use dispersy_shared::SyncStorage;

/// `acceptable_global_time = max(current, observed_median) + range`,
/// computed by the caller and passed in; bounding retained history is the
/// only purpose of this ceiling.
pub fn check_global_time_ceiling(global_time: GlobalTime, ceiling: GlobalTime) -> Result<(), DropReason> {
    if global_time > ceiling {
        return Err(DropReason::GlobalTimeTooHigh { global_time, ceiling });
    }
    Ok(())
}

pub enum DistributionOutcome {
    Accept,
    Drop(DropReason),
    Delay(DelayReason),
}

/// Full-sync check: ceiling, then (if sequence-numbered) contiguity.
pub fn check_full_sync<S: SyncStorage>(
    store: &MessageStore<S>,
    community: &CommunityId,
    member: MemberId,
    message: &Message,
    ceiling: GlobalTime,
) -> DistributionOutcome {
    if let Err(e) = check_global_time_ceiling(message.global_time, ceiling) {
        return DistributionOutcome::Drop(e);
    }

    if let Some(sequence_number) = message.sequence_number {
        match store.check_sequence(community, message.meta, member, sequence_number) {
            SequenceCheck::Accept => DistributionOutcome::Accept,
            SequenceCheck::Duplicate => DistributionOutcome::Drop(DropReason::Duplicate),
            SequenceCheck::Gap { low, high } => {
                DistributionOutcome::Delay(DelayReason::BySequence { low, high })
            }
        }
    } else {
        DistributionOutcome::Accept
    }
}

/// Last-sync check: ceiling, then the bounded-history accept/old decision.
/// Returns the bound check result so the caller can act on
/// `resend_newest` without re-querying storage.
pub fn check_last_sync<S: SyncStorage>(
    store: &MessageStore<S>,
    community: &CommunityId,
    member: MemberId,
    message: &Message,
    ceiling: GlobalTime,
    history_size: u32,
) -> Result<LastSyncCheck, DropReason> {
    check_global_time_ceiling(message.global_time, ceiling)?;
    Ok(store.check_last_sync_bound(community, message.meta, member, history_size, message.global_time))
}
