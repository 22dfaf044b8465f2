//! Cross-cutting invariants from the design's testable-properties section
//! that are not already exercised by a single module's own unit tests.

use std::net::Ipv4Addr;

use dispersy_node::store::memory::InMemoryStorage;
use dispersy_node::store::MessageStore;
use dispersy_shared::{is_valid_address, Message, SockAddrV4, SyncStorage};

fn msg(global_time: u64, packet: &[u8]) -> Message {
    Message {
        community: [9u8; 20],
        meta: "invariant-meta",
        authors: vec![1],
        global_time,
        sequence_number: None,
        packet: packet.to_vec(),
    }
}

/// Invariant 1: at most one stored packet per (community, member, global_time).
#[test]
fn invariant_uniqueness_holds_across_repeated_inserts() {
    let mut store = MessageStore::new(InMemoryStorage::new());
    let community = [9u8; 20];

    for packet in [b"a".as_slice(), b"b".as_slice(), b"c".as_slice()] {
        store.insert_syncable(&community, 1, &msg(42, packet));
    }

    let rows = store.storage().rows_for_meta(&community, "invariant-meta", Some(1));
    assert_eq!(rows.len(), 1);
}

/// Invariant 8: every address this crate treats as "known" either passes
/// validation or is exactly the unknown sentinel.
#[test]
fn invariant_address_validity_matches_the_documented_rule() {
    let cases = [
        (Ipv4Addr::new(0, 0, 0, 0), 0, false),
        (Ipv4Addr::new(10, 0, 0, 5), 0, false),
        (Ipv4Addr::new(10, 0, 0, 0), 1234, false),
        (Ipv4Addr::new(10, 0, 0, 255), 1234, false),
        (Ipv4Addr::new(10, 0, 0, 1), 1234, true),
    ];
    for (host, port, expected) in cases {
        let addr = SockAddrV4::new(host, port);
        assert_eq!(is_valid_address(&addr), expected, "address {addr}");
    }
}

/// Invariant 5: re-delivering an already-stored identical packet is a
/// no-op with respect to the stored row count.
#[test]
fn invariant_dedup_idempotence() {
    let mut store = MessageStore::new(InMemoryStorage::new());
    let community = [9u8; 20];
    store.insert_syncable(&community, 1, &msg(1, b"payload"));
    store.insert_syncable(&community, 1, &msg(1, b"payload"));
    store.insert_syncable(&community, 1, &msg(1, b"payload"));

    let rows = store.storage().rows_for_meta(&community, "invariant-meta", Some(1));
    assert_eq!(rows.len(), 1);
}
