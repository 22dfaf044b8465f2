//! # Dispersy Shared
//! Common types shared between the dispersy node engine and embedding applications.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod address;
mod collaborators;
mod error;
mod member;
mod message;
mod policy;
mod types;

pub use address::{is_valid_address, SockAddrV4};
pub use collaborators::{Conversion, Endpoint, Signer, SyncStorage, Verifier};
pub use error::{DelayReason, DropReason};
pub use member::{mid_of, Member, MemberId, Mid};
pub use message::{Message, MessageId, MetaMessage, StoredRow};
pub use policy::{Authentication, Destination, Direction, Distribution, Resolution};
pub use types::{CommunityId, GlobalTime, Signature};
