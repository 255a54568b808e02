use core::time::Duration;
use std::{collections::HashSet, thread::scope};

use crate::{
    CounterStore, Error, MemoryCounterStore, MemorySequenceStore, Segment, SequenceRow,
    SequenceStore,
};

#[test]
fn first_lease_seeds_row_from_init_value() {
    let store = MemorySequenceStore::new();
    assert_eq!(store.row().unwrap(), None);

    let segment = store.acquire_segment(10, 1000).unwrap();
    assert_eq!(segment, Segment { first: 1000, size: 10 });
    assert_eq!(segment.end(), 1010);
    assert_eq!(
        store.row().unwrap(),
        Some(SequenceRow {
            next_id: 1010,
            cache: 10
        })
    );
}

#[test]
fn init_value_is_ignored_once_row_exists() {
    let store = MemorySequenceStore::new();
    store.acquire_segment(5, 100).unwrap();
    let second = store.acquire_segment(5, 9999).unwrap();
    assert_eq!(second.first, 105);
}

#[test]
fn lease_records_requested_step() {
    let store = MemorySequenceStore::with_row(50, 1000);
    let segment = store.acquire_segment(20, 1).unwrap();
    assert_eq!(segment, Segment { first: 50, size: 20 });
    assert_eq!(store.row().unwrap().unwrap().cache, 20);
}

#[test]
fn lease_past_i64_max_is_refused() {
    let store = MemorySequenceStore::with_row(i64::MAX - 5, 10);
    assert!(matches!(
        store.acquire_segment(10, 1),
        Err(Error::SegmentExhausted)
    ));
    // The row is untouched by the refused lease.
    assert_eq!(store.row().unwrap().unwrap().next_id, i64::MAX - 5);
    assert_eq!(store.acquisitions(), 0);
}

#[test]
fn clones_share_one_row() {
    let store = MemorySequenceStore::new();
    let other = store.clone();

    let a = store.acquire_segment(10, 1).unwrap();
    let b = other.acquire_segment(10, 1).unwrap();
    assert_eq!(b.first, a.end());
    assert_eq!(store.acquisitions(), 2);
    assert_eq!(other.acquisitions(), 2);
}

#[test]
fn concurrent_leases_are_disjoint() {
    const THREADS: usize = 8;
    const LEASES: usize = 200;

    let store = MemorySequenceStore::new();
    let segments: Vec<Segment> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                s.spawn(move || {
                    (0..LEASES)
                        .map(|_| store.acquire_segment(3, 0).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let firsts: HashSet<i64> = segments.iter().map(|s| s.first).collect();
    assert_eq!(firsts.len(), THREADS * LEASES);
    assert!(firsts.iter().all(|first| first % 3 == 0));
    assert_eq!(
        store.row().unwrap().unwrap().next_id,
        (THREADS * LEASES * 3) as i64
    );
}

#[test]
fn counter_seeds_then_increments() {
    let store = MemoryCounterStore::new();
    let ttl = Duration::from_secs(60);

    assert_eq!(store.get("k").unwrap(), None);
    assert_eq!(store.incr_or_seed("k", 100, ttl).unwrap(), 101);
    // The seed only applies when the key is absent.
    assert_eq!(store.incr_or_seed("k", 5000, ttl).unwrap(), 102);
    assert_eq!(store.get("k").unwrap(), Some(102));

    assert_eq!(store.incr_or_seed("other", 7, ttl).unwrap(), 8);
}

#[test]
fn counter_reseeds_after_expiry() {
    let store = MemoryCounterStore::new();
    let ttl = Duration::from_millis(20);

    assert_eq!(store.incr_or_seed("k", 10, ttl).unwrap(), 11);
    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(store.get("k").unwrap(), None);
    assert_eq!(store.incr_or_seed("k", 500, ttl).unwrap(), 501);
}

#[test]
fn counter_overflow_is_a_store_error() {
    let store = MemoryCounterStore::new();
    let err = store
        .incr_or_seed("k", i64::MAX, Duration::from_secs(60))
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
}
