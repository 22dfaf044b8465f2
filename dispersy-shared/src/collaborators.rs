//! External collaborator contracts.
//!
//! These traits name the seams the engine talks to but does not implement:
//! the wire codec, the UDP socket, the relational database, and the ECC
//! library. Mirrors the split the server half of this codebase draws
//! between a connection's `Io`/transport abstraction and its own protocol
//! logic: the collaborator is swappable, the logic that drives it is not.

use crate::address::SockAddrV4;
use crate::error::DropReason;
use crate::member::MemberId;
use crate::message::{Message, MessageId, StoredRow};
use crate::types::{CommunityId, GlobalTime, Signature};

/// Encodes and decodes the wire format for a single community/version pair.
/// The byte layout itself (which bytes hold the signature, the member mid,
/// and so on) is entirely owned by the conversion implementation.
pub trait Conversion {
    /// Decode just enough of `bytes` to know which meta-message this is,
    /// without verifying authenticity.
    fn decode_meta(&self, bytes: &[u8]) -> Result<&'static str, DropReason>;

    /// Fully decode and, unless `skip_verify`, authenticate `bytes` into a
    /// [`Message`].
    fn decode_message(&self, bytes: &[u8], skip_verify: bool) -> Result<Message, DropReason>;

    /// Encode a message back to wire bytes, signing with the given
    /// authors' private keys as required by its authentication policy.
    fn encode_message(&self, message: &Message) -> Vec<u8>;
}

/// The UDP socket (or equivalent transport) collaborator.
pub trait Endpoint {
    /// Best-effort send; returns `false` if nothing could be sent (e.g. the
    /// socket is closed). Never blocks indefinitely.
    fn send(&mut self, destinations: &[SockAddrV4], bytes: &[u8]) -> bool;

    fn local_address(&self) -> SockAddrV4;

    fn total_up(&self) -> u64;
    fn total_down(&self) -> u64;
}

/// The persistence collaborator behind the message store. The relational
/// database technology itself is out of scope; this is the seam a real SQL
/// backend plugs into. Ships with an in-memory reference implementation in
/// `dispersy-node::store::memory`.
pub trait SyncStorage {
    fn insert_row(&mut self, row: StoredRow) -> MessageId;

    fn find_row(
        &self,
        community: &CommunityId,
        member: MemberId,
        global_time: GlobalTime,
    ) -> Option<&StoredRow>;

    fn delete_rows_by_member(&mut self, community: &CommunityId, member: MemberId) -> usize;

    /// Rows for `(community, meta)` ordered by ascending `global_time`,
    /// restricted to `member` when given (single-auth bound) or to the
    /// whole meta (double-auth pair bound, caller filters further).
    fn rows_for_meta(
        &self,
        community: &CommunityId,
        meta: &'static str,
        member: Option<MemberId>,
    ) -> Vec<&StoredRow>;

    fn count_for_meta_member(
        &self,
        community: &CommunityId,
        meta: &'static str,
        member: MemberId,
    ) -> usize;

    /// Highest stored sequence number for `(community, meta, member)`,
    /// i.e. the current row count for sequence-numbered meta-messages.
    fn highest_sequence(&self, community: &CommunityId, meta: &'static str, member: MemberId) -> u32;

    fn prune_oldest(&mut self, community: &CommunityId, meta: &'static str, member: MemberId) -> Option<StoredRow>;

    fn set_undone(&mut self, row_id: MessageId, undone_by: MessageId);

    /// Bloom-query support: rows in `[time_low, time_high]` with
    /// `(global_time + offset) % modulo == 0`, undone rows excluded,
    /// ordered by `(priority desc, global_time * direction)`.
    fn rows_in_sync_range(
        &self,
        community: &CommunityId,
        time_low: GlobalTime,
        time_high: GlobalTime,
        modulo: u32,
        offset: u32,
    ) -> Vec<&StoredRow>;
}

/// The ECC signing collaborator for our own member.
pub trait Signer {
    fn sign(&self, bytes: &[u8]) -> Signature;
}

/// The ECC verification collaborator for remote members.
pub trait Verifier {
    fn verify(&self, public_key: &[u8], bytes: &[u8], signature: &Signature) -> bool;
}
