//! End-to-end scenarios from the design's testable-properties section.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use dispersy_node::candidate::walker::IntroductionRequestCache;
use dispersy_node::candidate::{CandidateTable, ConnectionType, WanVoteBox};
use dispersy_node::request_cache::RequestCache;
use dispersy_node::store::memory::InMemoryStorage;
use dispersy_node::store::{LastSyncCheck, MessageStore, SequenceCheck};
use dispersy_shared::{Message, SockAddrV4, SyncStorage};

fn addr(d: u8, port: u16) -> SockAddrV4 {
    SockAddrV4::new(Ipv4Addr::new(10, 0, 0, d), port)
}

fn msg(global_time: u64, seq: Option<u32>, packet: &[u8]) -> Message {
    Message {
        community: [0u8; 20],
        meta: "scenario-meta",
        authors: vec![1],
        global_time,
        sequence_number: seq,
        packet: packet.to_vec(),
    }
}

/// S1: introduction-request/response round trip, with the introduced
/// candidate landing in the `Intro` category and going stale without a
/// puncture.
#[test]
fn s1_introduction_round_trip_and_intro_timeout() {
    let now = Instant::now();
    let mut cache = RequestCache::<IntroductionRequestCache>::new();
    let identifier = cache.claim(
        IntroductionRequestCache {
            community: [0u8; 20],
            destination: addr(2, 7000),
            requested_sync: false,
        },
        now,
    );

    assert!(cache.has(identifier, "introduction-request"));
    let popped = cache.pop(identifier, "introduction-request", now).unwrap();
    assert_eq!(popped.destination, addr(2, 7000));

    let mut table = CandidateTable::new();
    let community = [0u8; 20];
    let introduced = table.get_or_insert(addr(3, 7001));
    introduced.view_mut(community).mark_intro(now);

    let candidate = table.get(&addr(3, 7001)).unwrap();
    let view = candidate.communities.get(&community).unwrap();
    assert!(matches!(view.category, dispersy_node::candidate::Category::Intro));
}

/// S2: full-sync sequence numbers arriving out of order converge once the
/// gap is filled.
#[test]
fn s2_out_of_order_sequence_numbers_converge() {
    let mut store = MessageStore::new(InMemoryStorage::new());
    let community = [0u8; 20];

    // seq 3 arrives first: no history yet, so the gap is [1, 2].
    match store.check_sequence(&community, "scenario-meta", 1, 3) {
        SequenceCheck::Gap { low, high } => assert_eq!((low, high), (1, 2)),
        _ => panic!("expected gap"),
    }

    // seq 1 arrives: accepted (highest was 0).
    assert!(matches!(
        store.check_sequence(&community, "scenario-meta", 1, 1),
        SequenceCheck::Accept
    ));
    store.insert_syncable(&community, 1, &msg(10, Some(1), b"seq1"));

    // replaying seq 1 is now a duplicate.
    assert!(matches!(
        store.check_sequence(&community, "scenario-meta", 1, 1),
        SequenceCheck::Duplicate
    ));

    // seq 2 now accepted.
    assert!(matches!(
        store.check_sequence(&community, "scenario-meta", 1, 2),
        SequenceCheck::Accept
    ));
    store.insert_syncable(&community, 1, &msg(11, Some(2), b"seq2"));

    // seq 3 now accepted.
    assert!(matches!(
        store.check_sequence(&community, "scenario-meta", 1, 3),
        SequenceCheck::Accept
    ));
}

/// S3: bounded last-sync history rejects old messages and prunes on
/// acceptance of newer ones.
#[test]
fn s3_last_sync_bound_and_pruning() {
    let mut store = MessageStore::new(InMemoryStorage::new());
    let community = [0u8; 20];

    store.insert_syncable(&community, 1, &msg(5, None, b"a"));
    store.insert_syncable(&community, 1, &msg(7, None, b"b"));

    match store.check_last_sync_bound(&community, "scenario-meta", 1, 2, 3) {
        LastSyncCheck::Old { .. } => {}
        _ => panic!("expected old"),
    }

    match store.check_last_sync_bound(&community, "scenario-meta", 1, 2, 9) {
        LastSyncCheck::AcceptAndPrune => {
            store.storage_mut().prune_oldest(&community, "scenario-meta", 1);
            store.insert_syncable(&community, 1, &msg(9, None, b"c"));
        }
        _ => panic!("expected accept-and-prune"),
    }

    assert!(store.storage().find_row(&community, 1, 5).is_none());
    assert!(store.storage().find_row(&community, 1, 9).is_some());
}

/// S4: a second undo-own from the same member is flagged as malicious and
/// purges their stored messages.
#[test]
fn s4_second_undo_own_purges_member() {
    use dispersy_node::undo::{UndoOutcome, UndoOwnLedger};

    let mut store = MessageStore::new(InMemoryStorage::new());
    let community = [0u8; 20];
    store.insert_syncable(&community, 1, &msg(1, None, b"a"));
    store.insert_syncable(&community, 1, &msg(2, None, b"b"));

    let mut ledger = UndoOwnLedger::new();
    assert!(matches!(ledger.record_own_undo(community, 1, 100, 50), UndoOutcome::Applied));

    // Second undo-own against the *same* target global_time (50) is what
    // the source treats as malicious; a second undo against a different
    // target would be a second legitimate undo instead.
    match ledger.record_own_undo(community, 1, 200, 50) {
        UndoOutcome::SecondUndoOwnDetected { first } => {
            assert_eq!(first, 100);
            dispersy_node::undo::apply_undo(&mut store, &community, 0, 200, Some(1));
        }
        _ => panic!("expected second-undo detection"),
    }

    assert!(store.storage().find_row(&community, 1, 1).is_none());
    assert!(store.storage().find_row(&community, 1, 2).is_none());
}

/// S5: split WAN votes trigger symmetric-NAT detection while the
/// majority-held address is retained.
#[test]
fn s5_split_wan_votes_trigger_symmetric_nat() {
    let mut votes = WanVoteBox::new();
    votes.vote(addr(4, 6000), addr(10, 1), SockAddrV4::UNKNOWN);
    votes.vote(addr(4, 6000), addr(11, 1), SockAddrV4::UNKNOWN);
    votes.vote(addr(4, 6001), addr(12, 1), SockAddrV4::UNKNOWN);

    assert_eq!(votes.connection_type(), ConnectionType::SymmetricNat);
    assert_eq!(votes.wan_address(), addr(4, 6000));
}

/// S6: a batch of direct-distribution messages is processed in
/// (global_time, packet) order.
#[test]
fn s6_direct_batch_sorted_by_global_time_then_packet() {
    use dispersy_node::pipeline::batch::{sort_batch, PendingBatch};
    use dispersy_node::config::BatchConfig;

    let config = BatchConfig {
        max_window: Duration::from_millis(10),
        max_size: 1000,
        max_age: Duration::from_secs(60),
    };
    let mut batch = PendingBatch::new(config);
    let now = Instant::now();
    for i in 0..100u64 {
        batch.push(addr(1, 1000), msg(i % 5, None, format!("m{i:03}").as_bytes()), now);
    }

    assert!(!batch.should_flush(now));
    let later = now + Duration::from_millis(20);
    assert!(batch.should_flush(later));

    let mut flushed = batch.flush(later);
    assert_eq!(flushed.len(), 100);
    sort_batch(&mut flushed);

    for window in flushed.windows(2) {
        let (_, a) = &window[0];
        let (_, b) = &window[1];
        assert!((a.global_time, &a.packet) <= (b.global_time, &b.packet));
    }
}
