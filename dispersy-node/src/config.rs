use std::default::Default;
use std::time::Duration;

/// Every numeric knob the overlay's design names as a literal default.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Timeout for an outstanding `dispersy-introduction-request`.
    pub introduction_request_timeout: Duration,
    /// Minimum spacing between sync (bloom-filter) exchanges per community.
    pub sync_interval: Duration,
    /// How long an obsolete candidate is kept before being pruned.
    pub candidate_cleanup_interval: Duration,
    /// How often the database watchdog commits.
    pub commit_interval: Duration,
    /// Span added to the current global_time to compute the acceptable
    /// ceiling for incoming messages.
    pub acceptable_global_time_range: u64,
    /// Byte budget for a single sync response to one requester.
    pub sync_response_byte_limit: usize,
    /// Byte budget for a single missing-sequence response to one requester.
    pub missing_sequence_response_byte_limit: usize,
    /// Timeout for missing-identity / missing-proof requests.
    pub missing_identity_timeout: Duration,
    /// Timeout for missing-message / missing-sequence / missing-last-message
    /// requests.
    pub missing_message_timeout: Duration,
    /// Maximum age for a drift correction before the walker clock is reset.
    pub walker_drift_tolerance: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            introduction_request_timeout: Duration::from_millis(10_500),
            sync_interval: Duration::from_millis(4_500),
            candidate_cleanup_interval: Duration::from_secs(5 * 60),
            commit_interval: Duration::from_secs(60),
            acceptable_global_time_range: 10_000,
            sync_response_byte_limit: 1 << 17,
            missing_sequence_response_byte_limit: 1 << 16,
            missing_identity_timeout: Duration::from_millis(4_500),
            missing_message_timeout: Duration::from_secs(10),
            walker_drift_tolerance: Duration::from_secs(5),
        }
    }
}

/// Per-batch collection window for a meta-message's ingress batcher.
#[derive(Clone, Copy, Debug)]
pub struct BatchConfig {
    pub max_window: Duration,
    pub max_size: usize,
    pub max_age: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_window: Duration::from_millis(500),
            max_size: 256,
            max_age: Duration::from_secs(60),
        }
    }
}
