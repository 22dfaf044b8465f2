//! Multi-party signature collection via
//! `dispersy-signature-request`/`dispersy-signature-response`.

use std::time::Duration;

use dispersy_shared::{GlobalTime, MemberId, MetaMessage};

use crate::request_cache::CacheEntry;

/// What the initiator's `allow_signature_func` returned for a co-signer's
/// response: the co-signer may modify the payload (still subject to the
/// same-meta/first-author/global_time identity checks) before signing.
pub struct SignatureResponse {
    pub packet: Vec<u8>,
    pub was_modified: bool,
}

#[derive(Clone, Debug)]
pub struct SignatureRequestCache {
    pub meta: &'static str,
    pub first_author: MemberId,
    pub global_time: GlobalTime,
    pub required_signers: Vec<MemberId>,
    pub received: Vec<MemberId>,
}

impl CacheEntry for SignatureRequestCache {
    fn kind(&self) -> &'static str {
        "signature-request"
    }
    fn timeout_delay(&self) -> Duration {
        Duration::from_secs(10)
    }
}

impl SignatureRequestCache {
    pub fn is_complete(&self) -> bool {
        self.required_signers.iter().all(|m| self.received.contains(m))
    }
}

/// Validates a `dispersy-signature-response` against the outstanding
/// request: it must reference the same meta-message, the same first
/// author, and the same global_time, or it cannot possibly be a response
/// to this request (preventing a co-signer from substituting a completely
/// different message under our nose).
pub fn validate_response(cache: &SignatureRequestCache, meta: &MetaMessage, first_author: MemberId, global_time: GlobalTime) -> bool {
    cache.meta == meta.name && cache.first_author == first_author && cache.global_time == global_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispersy_shared::{Authentication, Destination, Direction, Distribution, Resolution};

    fn meta() -> MetaMessage {
        MetaMessage {
            name: "co-signed",
            authentication: Authentication::DoubleMember,
            resolution: Resolution::Public,
            distribution: Distribution::FullSync {
                enable_sequence_number: false,
                priority: 100,
                direction: Direction::Ascending,
            },
            destination: Destination::Candidate,
        }
    }

    #[test]
    fn rejects_mismatched_identity() {
        let cache = SignatureRequestCache {
            meta: "co-signed",
            first_author: 1,
            global_time: 5,
            required_signers: vec![2],
            received: vec![],
        };
        assert!(!validate_response(&cache, &meta(), 1, 6));
        assert!(validate_response(&cache, &meta(), 1, 5));
    }

    #[test]
    fn completion_requires_every_signer() {
        let mut cache = SignatureRequestCache {
            meta: "co-signed",
            first_author: 1,
            global_time: 5,
            required_signers: vec![2, 3],
            received: vec![2],
        };
        assert!(!cache.is_complete());
        cache.received.push(3);
        assert!(cache.is_complete());
    }
}
