//! Permission timeline: authorize/revoke/dynamic-settings history yielding
//! the resolution policy in effect for `(meta-message, member, permission)`
//! at a given global_time.

use std::collections::HashMap;

use dispersy_shared::{GlobalTime, MemberId, Resolution};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Permission {
    Authorize,
    Revoke,
    Undo,
}

#[derive(Clone, Debug)]
struct Grant {
    from: GlobalTime,
    to: Option<GlobalTime>,
}

#[derive(Default)]
pub struct Timeline {
    grants: HashMap<(&'static str, MemberId, Permission), Vec<Grant>>,
    /// Resolution policy override installed by a `dispersy-dynamic-settings`
    /// message, keyed by meta-message and effective from a given time.
    resolution_overrides: HashMap<&'static str, Vec<(GlobalTime, Resolution)>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorize(&mut self, meta: &'static str, member: MemberId, permission: Permission, from: GlobalTime) {
        self.grants
            .entry((meta, member, permission))
            .or_default()
            .push(Grant { from, to: None });
    }

    pub fn revoke(&mut self, meta: &'static str, member: MemberId, permission: Permission, at: GlobalTime) {
        if let Some(grants) = self.grants.get_mut(&(meta, member, permission)) {
            for grant in grants.iter_mut() {
                if grant.to.is_none() && grant.from <= at {
                    grant.to = Some(at);
                }
            }
        }
    }

    pub fn has_permission(&self, meta: &'static str, member: MemberId, permission: Permission, at: GlobalTime) -> bool {
        self.grants
            .get(&(meta, member, permission))
            .map(|grants| {
                grants
                    .iter()
                    .any(|g| g.from <= at && g.to.map(|to| at < to).unwrap_or(true))
            })
            .unwrap_or(false)
    }

    pub fn set_resolution(&mut self, meta: &'static str, from: GlobalTime, resolution: Resolution) {
        self.resolution_overrides.entry(meta).or_default().push((from, resolution));
    }

    /// The resolution policy in effect at `at`, falling back to the
    /// meta-message's compiled-in default when no dynamic-settings
    /// override applies yet.
    pub fn resolution_at(&self, meta: &'static str, at: GlobalTime, default: Resolution) -> Resolution {
        self.resolution_overrides
            .get(meta)
            .and_then(|overrides| overrides.iter().filter(|(from, _)| *from <= at).max_by_key(|(from, _)| *from))
            .map(|(_, r)| *r)
            .unwrap_or(default)
    }

    /// Whether `member` may publish `meta` given `resolution`: public
    /// policies need nothing further, linear policies need an active
    /// authorize grant.
    pub fn may_publish(&self, meta: &'static str, member: MemberId, resolution: Resolution, at: GlobalTime) -> bool {
        match resolution {
            Resolution::Public => true,
            Resolution::Linear => self.has_permission(meta, member, Permission::Authorize, at),
        }
    }
}
