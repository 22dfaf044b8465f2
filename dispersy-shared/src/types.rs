//! Small value types used throughout the crate.

/// A 20-byte community identifier, equal to the mid of the community's master member.
pub type CommunityId = [u8; 20];

/// Per-community monotonically non-decreasing logical clock.
pub type GlobalTime = u64;

/// An opaque, collaborator-produced signature over a packet.
pub type Signature = Vec<u8>;
