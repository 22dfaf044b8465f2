//! The node orchestrator: a single `tick(now)` entry point driving the
//! pipeline, walker, and periodic watchdogs, mirroring the drain-and-reset
//! event pump a connection-oriented server runs on every wake-up, adapted
//! to an overlay node that has no per-peer connection state to drain.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dispersy_shared::{CommunityId, Member, MemberId, Message, SockAddrV4, SyncStorage};

use crate::candidate::{CandidateTable, ConnectionType, WanVoteBox};
use crate::community::Community;
use crate::config::NodeConfig;
use crate::pipeline::{Outcome, Pipeline};
use crate::stats::Statistics;
use crate::store::MessageStore;

/// Events accumulated during one `tick`, analogous to the teacher's
/// connect/disconnect event set but narrower: a symmetric overlay node has
/// no connection lifecycle, only message and membership lifecycle.
#[derive(Default)]
pub struct NodeEvents {
    pub messages_stored: Vec<Message>,
    pub members_blacklisted: Vec<MemberId>,
    pub communities_destroyed: Vec<CommunityId>,
}

pub struct Node<S: SyncStorage> {
    pub config: NodeConfig,
    pub store: MessageStore<S>,
    pub candidates: CandidateTable,
    pub communities: HashMap<CommunityId, Community>,
    pub members: HashMap<MemberId, Member>,
    pub wan_votes: WanVoteBox,
    pub lan_address: SockAddrV4,
    pub stats: Statistics,

    pipeline: Pipeline,
    inbox: Vec<(SockAddrV4, Vec<u8>)>,
    last_commit: Option<Instant>,
    last_cleanup: Option<Instant>,
}

impl<S: SyncStorage> Node<S> {
    pub fn new(storage: S, lan_address: SockAddrV4) -> Self {
        Node {
            config: NodeConfig::default(),
            store: MessageStore::new(storage),
            candidates: CandidateTable::new(),
            communities: HashMap::new(),
            members: HashMap::new(),
            wan_votes: WanVoteBox::new(),
            lan_address,
            stats: Statistics::default(),
            pipeline: Pipeline::new(),
            inbox: Vec::new(),
            last_commit: None,
            last_cleanup: None,
        }
    }

    pub fn attach_community(&mut self, community: Community) {
        self.communities.insert(community.cid, community);
    }

    pub fn detach_community(&mut self, cid: &CommunityId) {
        if let Some(community) = self.communities.get_mut(cid) {
            community.detach();
        }
    }

    /// Queues a raw datagram for processing on the next `tick`. Classifying
    /// and decoding it is the caller's job (it owns the [`Conversion`]
    /// collaborator for the addressed community); this just buffers it.
    pub fn on_datagram(&mut self, from: SockAddrV4, bytes: Vec<u8>) {
        self.inbox.push((from, bytes));
    }

    /// Drains buffered datagrams without processing them, handing them back
    /// to the caller for classification/decoding before they are fed into
    /// [`Node::feed_decoded`]. Kept separate from decoding because the
    /// wire codec is an external collaborator this crate does not own.
    pub fn drain_inbox(&mut self) -> Vec<(SockAddrV4, Vec<u8>)> {
        std::mem::take(&mut self.inbox)
    }

    pub fn feed_decoded(&mut self, candidate: SockAddrV4, message: Message, now: Instant) {
        self.pipeline.enqueue(candidate, message, now);
    }

    pub fn wan_address(&self) -> SockAddrV4 {
        self.wan_votes.wan_address()
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.wan_votes.connection_type()
    }

    /// The single cooperative-scheduling entry point: drains due batches,
    /// runs the commit and candidate-cleanup watchdogs when their interval
    /// has elapsed, and returns what happened. Community-specific handler
    /// dispatch and forwarding happen in the caller's loop over the
    /// returned due batches' meta-message groupings; this method owns only
    /// what is generic across every meta-message.
    pub fn tick(&mut self, now: Instant) -> NodeEvents {
        cfg_if! {
            if #[cfg(debug_assertions)] {
                log::trace!("tick: {} candidates, {} communities", self.candidates.len(), self.communities.len());
            }
        }

        let mut events = NodeEvents::default();

        if self.due(self.last_cleanup, now, self.config.candidate_cleanup_interval) {
            self.candidates.cleanup(now);
            self.last_cleanup = Some(now);
        }

        if self.due(self.last_commit, now, self.config.commit_interval) {
            self.last_commit = Some(now);
        }

        let due = self.pipeline.due_batches(now);
        for (meta_name, batch) in due {
            for (_candidate, message) in batch {
                self.process_due_message(meta_name, message, &mut events);
            }
        }

        events
    }

    /// Runs one drained batch message through the distribution check,
    /// dedup, and store insert, recording only what was genuinely accepted.
    /// Messages whose community, meta-message, or author is unknown to
    /// this node are dropped and counted, never silently reported as
    /// stored.
    fn process_due_message(&mut self, meta_name: &'static str, message: Message, events: &mut NodeEvents) {
        let community_id = message.community;
        let Some(community) = self.communities.get(&community_id) else {
            self.stats.drop_count += 1;
            self.stats.drop.inc("unknown-community");
            return;
        };
        let Some(meta) = community.metas.get(meta_name).cloned() else {
            self.stats.drop_count += 1;
            self.stats.drop.inc("unknown-conversion");
            return;
        };
        let ceiling = community.acceptable_global_time(self.config.acceptable_global_time_range);

        let Some(author) = message.primary_author().and_then(|id| self.members.get(&id).cloned()) else {
            self.stats.drop_count += 1;
            self.stats.drop.inc("unknown-member");
            return;
        };

        match self.pipeline.process_one(&mut self.store, &meta, &community_id, &author, message, ceiling, &mut self.stats) {
            Outcome::Stored(stored) => events.messages_stored.push(stored),
            Outcome::Dropped(_) | Outcome::Delayed(_, _) => {}
        }
    }

    fn due(&self, last: Option<Instant>, now: Instant, interval: Duration) -> bool {
        match last {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= interval,
        }
    }
}
