use dispersy_shared::{DelayReason, DropReason};
use thiserror::Error;

/// Outcome of feeding one packet through the ingress pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("dropped: {0}")]
    Drop(#[from] DropReason),

    #[error("delayed: {0}")]
    Delay(#[from] DelayReason),
}

/// Errors raised at the create/publish boundary, the only place validation
/// failures are meant to surface to the caller rather than merely being
/// logged and counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("no candidates available to forward this message to")]
    NoForwardTarget,

    #[error("unauthorized: resolution policy refuses this member for this meta-message")]
    Unauthorized,

    #[error("community {0:?} is not attached to this node")]
    UnknownCommunity([u8; 20]),
}

/// Errors raised by request-cache lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("no live cache entry for identifier {0}")]
    NotFound(u16),

    /// SECURITY: a kind mismatch on lookup prevents identifier confusion
    /// between unrelated request protocols sharing the 16-bit id space.
    #[error("cache entry {0} exists but is not of the expected kind")]
    KindMismatch(u16),
}
