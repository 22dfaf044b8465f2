//! Members: public-key-identified overlay participants.

use sha1::{Digest, Sha1};

/// A 20-byte digest of a member's public key. Short, and possibly colliding
/// across distinct public keys, which is why lookups by `Mid` return
/// zero-or-more members rather than exactly one.
pub type Mid = [u8; 20];

/// The stable integer id a member is assigned by the embedding node's arena.
/// Never reused for the lifetime of the process.
pub type MemberId = u64;

/// `mid = sha1(public_key_bytes)`, a fixed non-pluggable transform (unlike
/// signing/verification, which are named collaborators in [`crate::Signer`]
/// and [`crate::Verifier`]).
pub fn mid_of(public_key: &[u8]) -> Mid {
    let mut hasher = Sha1::new();
    hasher.update(public_key);
    let digest = hasher.finalize();
    let mut mid = [0u8; 20];
    mid.copy_from_slice(&digest);
    mid
}

/// A known member of a community.
#[derive(Clone, Debug)]
pub struct Member {
    pub id: MemberId,
    pub mid: Mid,
    pub public_key: Vec<u8>,
    /// Present only for our own member(s); absent for remote members.
    pub private_key: Option<Vec<u8>>,
    /// Set once this member's traffic is proven malicious (see the undo
    /// component's second-undo-own detection).
    pub blacklisted: bool,
}

impl Member {
    pub fn new(id: MemberId, public_key: Vec<u8>, private_key: Option<Vec<u8>>) -> Self {
        let mid = mid_of(&public_key);
        Member {
            id,
            mid,
            public_key,
            private_key,
            blacklisted: false,
        }
    }

    pub fn is_own(&self) -> bool {
        self.private_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_is_deterministic() {
        let a = mid_of(b"some-public-key-bytes");
        let b = mid_of(b"some-public-key-bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_usually_differ() {
        let a = mid_of(b"key-one");
        let b = mid_of(b"key-two");
        assert_ne!(a, b);
    }
}
