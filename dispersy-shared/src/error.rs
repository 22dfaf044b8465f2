//! Drop and delay reasons.
//!
//! `DropReason` is terminal: the packet or message is discarded and a
//! counter is bumped. `DelayReason` names a dependency that, once
//! satisfied, lets the pipeline resume processing the same packet; each
//! variant corresponds to exactly one `dispersy-missing-*` request.

use thiserror::Error;

/// Unrecoverable validation failures. Every variant is counted by name in
/// the node's statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("packet addressed to an unknown community")]
    UnknownCommunity,

    #[error("no conversion registered for this community/version")]
    UnknownConversion,

    #[error("packet failed to decode: {reason}")]
    DecodeFailed { reason: String },

    #[error("duplicate message for (member, global_time), identical packet")]
    Duplicate,

    #[error("message older than the retained history for this meta-message")]
    Old,

    #[error("global_time {global_time} exceeds the acceptable ceiling {ceiling}")]
    GlobalTimeTooHigh { global_time: u64, ceiling: u64 },

    #[error("(community, member, global_time) uniqueness would be violated")]
    UniquenessViolation,

    #[error("observed malicious proof for this member")]
    MaliciousProof,

    #[error("community resolution policy refuses this message")]
    Unauthorized,

    #[error("community-supplied check callback refused this message")]
    CheckCallbackRefused { reason: String },
}

/// Recoverable-pending-dependency conditions. The pipeline resumes the
/// packet automatically if the dependency arrives within the request
/// cache's timeout-plus-cleanup window (SECURITY: an attacker cannot use
/// this to pin unbounded memory, since the window is finite and per-key
/// idempotent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelayReason {
    #[error("missing authorize-proof chain")]
    ByProof,

    #[error("missing sequence numbers {low}..={high} for this member")]
    BySequence { low: u32, high: u32 },

    #[error("missing referenced message at global_time {global_time}")]
    ByMissingMessage { global_time: u64 },

    #[error("missing identity for member")]
    ByMissingMember,
}
