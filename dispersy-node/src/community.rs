//! Community lifecycle: attach/detach, reclassify, soft/hard destroy.

use std::collections::HashMap;

use dispersy_shared::{CommunityId, GlobalTime, MetaMessage};

use crate::timeline::Timeline;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LifecycleState {
    Attached,
    /// Frozen: messages beyond the destroy message's global_time are
    /// rejected, but history is retained.
    SoftKilled { at: GlobalTime },
    /// Pruned to the destroy proof chain; reclassified to a preview class.
    HardKilled,
    Detached,
}

pub struct Community {
    pub cid: CommunityId,
    pub classification: String,
    pub global_time: GlobalTime,
    pub timeline: Timeline,
    pub metas: HashMap<&'static str, MetaMessage>,
    pub state: LifecycleState,
}

impl Community {
    pub fn new(cid: CommunityId, classification: impl Into<String>) -> Self {
        Community {
            cid,
            classification: classification.into(),
            global_time: 0,
            timeline: Timeline::new(),
            metas: HashMap::new(),
            state: LifecycleState::Attached,
        }
    }

    pub fn register_meta(&mut self, meta: MetaMessage) {
        self.metas.insert(meta.name, meta);
    }

    pub fn advance_global_time(&mut self, observed: GlobalTime) {
        if observed > self.global_time {
            self.global_time = observed;
        }
    }

    pub fn acceptable_global_time(&self, range: GlobalTime) -> GlobalTime {
        self.global_time + range
    }

    pub fn detach(&mut self) {
        self.state = LifecycleState::Detached;
    }

    pub fn reclassify(&mut self, classification: impl Into<String>) {
        self.classification = classification.into();
    }

    pub fn soft_kill(&mut self, at: GlobalTime) {
        self.state = LifecycleState::SoftKilled { at };
    }

    pub fn hard_kill(&mut self) {
        self.state = LifecycleState::HardKilled;
        self.classification = format!("{}-preview", self.classification);
        log::info!("community {:02x?} hard-killed, reclassified to {}", &self.cid[..4], self.classification);
    }

    /// Whether a message at `global_time` may still be accepted given the
    /// lifecycle state.
    pub fn accepts(&self, global_time: GlobalTime) -> bool {
        match self.state {
            LifecycleState::Attached => true,
            LifecycleState::SoftKilled { at } => global_time <= at,
            LifecycleState::HardKilled | LifecycleState::Detached => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_kill_rejects_messages_past_the_destroy_time() {
        let mut community = Community::new([0u8; 20], "test");
        community.soft_kill(100);
        assert!(community.accepts(50));
        assert!(!community.accepts(150));
    }

    #[test]
    fn hard_kill_rejects_everything_and_renames_classification() {
        let mut community = Community::new([0u8; 20], "test");
        community.hard_kill();
        assert!(!community.accepts(0));
        assert_eq!(community.classification, "test-preview");
    }

    #[test]
    fn global_time_only_advances() {
        let mut community = Community::new([0u8; 20], "test");
        community.advance_global_time(10);
        community.advance_global_time(5);
        assert_eq!(community.global_time, 10);
    }
}
