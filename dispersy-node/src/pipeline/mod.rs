//! Ingress pipeline: classify, batch, validate, dedupe, delay, store,
//! dispatch.

pub mod batch;
pub mod distribution;

use std::collections::HashMap;
use std::time::Instant;

use dispersy_shared::{CommunityId, DelayReason, DropReason, Distribution, Member, MemberId, Message, MetaMessage, SockAddrV4, SyncStorage};

use crate::config::BatchConfig;
use crate::stats::Statistics;
use crate::store::{Insert, LastSyncCheck, MessageStore};
use batch::{sort_batch, PendingBatch};
use distribution::DistributionOutcome;

/// What the pipeline did with one message, for the caller (community
/// handler dispatch, forwarding) to act on.
pub enum Outcome {
    Stored(Message),
    Dropped(DropReason),
    Delayed(DelayReason, Message),
}

pub struct Pipeline {
    batches: HashMap<(&'static str, SockAddrV4), PendingBatch>,
    default_batch_config: BatchConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline {
            batches: HashMap::new(),
            default_batch_config: BatchConfig::default(),
        }
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a decoded message for batching. Messages whose meta-message
    /// disables batching should instead go straight to
    /// [`Pipeline::process_one`].
    pub fn enqueue(&mut self, candidate: SockAddrV4, message: Message, now: Instant) {
        let key = (message.meta, candidate);
        self.batches
            .entry(key)
            .or_insert_with(|| PendingBatch::new(self.default_batch_config))
            .push(candidate, message, now);
    }

    /// Flushes every batch whose window has elapsed, returning the flushed
    /// groups keyed by meta-message name for the caller to run through
    /// [`Pipeline::process_one`] in order.
    pub fn due_batches(&mut self, now: Instant) -> Vec<(&'static str, Vec<(SockAddrV4, Message)>)> {
        let mut due = Vec::new();
        let keys: Vec<_> = self
            .batches
            .iter()
            .filter(|(_, b)| b.should_flush(now))
            .map(|(k, _)| *k)
            .collect();
        for key in keys {
            if let Some(batch) = self.batches.get_mut(&key) {
                let mut items = batch.flush(now);
                if items.is_empty() {
                    continue;
                }
                sort_batch(&mut items);
                due.push((key.0, items));
            }
        }
        due
    }

    /// Runs the distribution-policy check and, if accepted, the store
    /// insert for one message. The community-supplied check callback and
    /// the forward step are the caller's responsibility: they depend on
    /// application payload semantics this crate does not own.
    pub fn process_one<S: SyncStorage>(
        &mut self,
        store: &mut MessageStore<S>,
        meta: &MetaMessage,
        community: &CommunityId,
        author: &Member,
        message: Message,
        ceiling: u64,
        stats: &mut Statistics,
    ) -> Outcome {
        stats.received_count += 1;

        if author.blacklisted {
            stats.drop_count += 1;
            stats.drop.inc("malicious-member");
            return Outcome::Dropped(DropReason::MaliciousProof);
        }

        match &meta.distribution {
            Distribution::Direct => {
                stats.success_count += 1;
                Outcome::Stored(message)
            }
            Distribution::FullSync { .. } => {
                match distribution::check_full_sync(store, community, author.id, &message, ceiling) {
                    DistributionOutcome::Accept => self.store_and_finish(store, community, author.id, message, stats),
                    DistributionOutcome::Drop(reason) => {
                        stats.drop_count += 1;
                        stats.drop.inc("full-sync");
                        log::warn!("dropping full-sync message from member {}: {reason}", author.id);
                        Outcome::Dropped(reason)
                    }
                    DistributionOutcome::Delay(reason) => {
                        stats.delay_count += 1;
                        stats.delay.inc("full-sync-sequence");
                        log::debug!("delaying full-sync message from member {}: {reason}", author.id);
                        Outcome::Delayed(reason, message)
                    }
                }
            }
            Distribution::LastSync { history_size, .. } => {
                let check = distribution::check_last_sync(store, community, author.id, &message, ceiling, *history_size);
                match check {
                    Err(reason) => {
                        stats.drop_count += 1;
                        stats.drop.inc("last-sync-ceiling");
                        Outcome::Dropped(reason)
                    }
                    Ok(LastSyncCheck::Old { .. }) => {
                        stats.drop_count += 1;
                        stats.drop.inc("last-sync-old");
                        Outcome::Dropped(DropReason::Old)
                    }
                    Ok(LastSyncCheck::AcceptAndPrune) => {
                        store.storage_mut().prune_oldest(community, meta.name, author.id);
                        self.store_and_finish(store, community, author.id, message, stats)
                    }
                    Ok(LastSyncCheck::Accept) => self.store_and_finish(store, community, author.id, message, stats),
                }
            }
        }
    }

    fn store_and_finish<S: SyncStorage>(
        &mut self,
        store: &mut MessageStore<S>,
        community: &CommunityId,
        member: MemberId,
        message: Message,
        stats: &mut Statistics,
    ) -> Outcome {
        match store.insert_syncable(community, member, &message) {
            Insert::Stored(_) => {
                stats.success_count += 1;
                stats.success.inc(message.meta);
                Outcome::Stored(message)
            }
            Insert::DuplicateIdentical { .. } => {
                stats.drop_count += 1;
                stats.drop.inc("duplicate-identical");
                Outcome::Dropped(DropReason::Duplicate)
            }
            Insert::DuplicateConflicting { .. } => {
                stats.drop_count += 1;
                stats.drop.inc("duplicate-conflicting");
                Outcome::Dropped(DropReason::Duplicate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispersy_shared::{Authentication, Destination, Direction, Resolution};
    use std::net::Ipv4Addr;

    fn meta_full_sync_seq() -> MetaMessage {
        MetaMessage {
            name: "test-full-sync",
            authentication: Authentication::SingleMember,
            resolution: Resolution::Public,
            distribution: Distribution::FullSync {
                enable_sequence_number: true,
                priority: 100,
                direction: Direction::Ascending,
            },
            destination: Destination::Community { count: 10 },
        }
    }

    fn msg(global_time: u64, seq: u32) -> Message {
        Message {
            community: [0u8; 20],
            meta: "test-full-sync",
            authors: vec![1],
            global_time,
            sequence_number: Some(seq),
            packet: format!("seq{seq}").into_bytes(),
        }
    }

    #[test]
    fn stores_in_order_sequence_and_rejects_replay() {
        use crate::store::memory::InMemoryStorage;
        let mut pipeline = Pipeline::new();
        let mut store = MessageStore::new(InMemoryStorage::new());
        let mut stats = Statistics::default();
        let meta = meta_full_sync_seq();
        let community = [0u8; 20];
        let author = Member::new(1, b"pk".to_vec(), None);

        let outcome = pipeline.process_one(&mut store, &meta, &community, &author, msg(1, 1), 1000, &mut stats);
        assert!(matches!(outcome, Outcome::Stored(_)));

        let replay = pipeline.process_one(&mut store, &meta, &community, &author, msg(1, 1), 1000, &mut stats);
        assert!(matches!(replay, Outcome::Dropped(_)));
    }

    #[test]
    fn blacklisted_author_is_dropped() {
        use crate::store::memory::InMemoryStorage;
        let mut pipeline = Pipeline::new();
        let mut store = MessageStore::new(InMemoryStorage::new());
        let mut stats = Statistics::default();
        let meta = meta_full_sync_seq();
        let community = [0u8; 20];
        let mut author = Member::new(1, b"pk".to_vec(), None);
        author.blacklisted = true;

        let outcome = pipeline.process_one(&mut store, &meta, &community, &author, msg(1, 1), 1000, &mut stats);
        assert!(matches!(outcome, Outcome::Dropped(DropReason::MaliciousProof)));
    }

    #[test]
    fn due_batches_only_flush_after_window() {
        let mut pipeline = Pipeline::new();
        let now = Instant::now();
        let addr = SockAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 1);
        pipeline.enqueue(addr, msg(1, 1), now);
        assert!(pipeline.due_batches(now).is_empty());
    }
}
